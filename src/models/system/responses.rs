use serde::Serialize;
use ts_rs::TS;

use super::entities::SystemSetting;

/// Settings visible to any signed-in user
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct PublicSettingsResponse {
    pub system_name: String,
    pub transfer_min_amount: i64,
    pub transfer_max_amount: i64,
    pub transfer_max_recipients: i64,
    pub environment: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub database: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct ConfigListResponse {
    pub items: Vec<SystemSetting>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemStats {
    pub total_users: i64,
    pub active_users: i64,
    pub admins: i64,
    pub teachers: i64,
    pub students: i64,
    pub institutions: i64,
    pub courses: i64,
    pub transfers: i64,
    /// Sum of all transfer totals
    pub total_transferred: i64,
    /// Sum of all user balances
    pub total_balance: i64,
}
