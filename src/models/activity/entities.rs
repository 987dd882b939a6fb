use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Every action recorded in `activity_logs`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub enum ActivityAction {
    Login,
    Logout,
    LoginFailed,
    ProfileUpdated,
    PasswordChanged,
    NotificationsUpdated,
    UserCreated,
    UserUpdated,
    UserDeleted,
    BalanceAdjusted,
    BulkUpload,
    TransferSent,
    TransferReceived,
    ConfigUpdated,
    InstitutionCreated,
    InstitutionUpdated,
    InstitutionDeleted,
    CourseCreated,
    CourseUpdated,
    CourseDeleted,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 20] = [
        ActivityAction::Login,
        ActivityAction::Logout,
        ActivityAction::LoginFailed,
        ActivityAction::ProfileUpdated,
        ActivityAction::PasswordChanged,
        ActivityAction::NotificationsUpdated,
        ActivityAction::UserCreated,
        ActivityAction::UserUpdated,
        ActivityAction::UserDeleted,
        ActivityAction::BalanceAdjusted,
        ActivityAction::BulkUpload,
        ActivityAction::TransferSent,
        ActivityAction::TransferReceived,
        ActivityAction::ConfigUpdated,
        ActivityAction::InstitutionCreated,
        ActivityAction::InstitutionUpdated,
        ActivityAction::InstitutionDeleted,
        ActivityAction::CourseCreated,
        ActivityAction::CourseUpdated,
        ActivityAction::CourseDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::LoginFailed => "login_failed",
            ActivityAction::ProfileUpdated => "profile_updated",
            ActivityAction::PasswordChanged => "password_changed",
            ActivityAction::NotificationsUpdated => "notifications_updated",
            ActivityAction::UserCreated => "user_created",
            ActivityAction::UserUpdated => "user_updated",
            ActivityAction::UserDeleted => "user_deleted",
            ActivityAction::BalanceAdjusted => "balance_adjusted",
            ActivityAction::BulkUpload => "bulk_upload",
            ActivityAction::TransferSent => "transfer_sent",
            ActivityAction::TransferReceived => "transfer_received",
            ActivityAction::ConfigUpdated => "config_updated",
            ActivityAction::InstitutionCreated => "institution_created",
            ActivityAction::InstitutionUpdated => "institution_updated",
            ActivityAction::InstitutionDeleted => "institution_deleted",
            ActivityAction::CourseCreated => "course_created",
            ActivityAction::CourseUpdated => "course_updated",
            ActivityAction::CourseDeleted => "course_deleted",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityAction::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid activity action: {s}"))
    }
}

impl<'de> Deserialize<'de> for ActivityAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("Acción inválida: '{s}'")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip() {
        for action in ActivityAction::ALL {
            assert_eq!(action.as_str().parse::<ActivityAction>().unwrap(), action);
        }
        assert!("hacked".parse::<ActivityAction>().is_err());
    }

    #[test]
    fn test_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ActivityAction::TransferReceived).unwrap(),
            "transfer_received"
        );
    }
}
