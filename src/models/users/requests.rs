use super::entities::{UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct CreateUserRequest {
    pub rut: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Defaults to `users.initial_balance`
    pub balance: Option<i64>,
    pub institution_id: Option<i64>,
    pub course_id: Option<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Signed balance adjustment done by an administrator
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct AdjustBalanceRequest {
    pub amount: i64,
    pub reason: Option<String>,
}

/// Storage-level list filter
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

/// Validated, normalized user ready to persist.
///
/// `password_hash` is already hashed. A `students` or `teachers` row is
/// created alongside for those roles.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub rut: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub balance: i64,
    pub institution_id: Option<i64>,
    pub course_id: Option<i64>,
}

/// Storage-level partial update, `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some("")` clears the stored phone
    pub phone: Option<String>,
    /// `Some("")` clears the stored avatar
    pub avatar_url: Option<String>,
    pub email_notifications: Option<bool>,
    pub transfer_notifications: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_optional_fields() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"rut":"12.345.678-5","email":"a@b.cl","password":"Secreta123",
                "role":"student","first_name":"Ana","last_name":"Soto"}"#,
        )
        .unwrap();
        assert_eq!(req.role, UserRole::Student);
        assert!(req.balance.is_none());
        assert!(req.course_id.is_none());
    }

    #[test]
    fn test_create_request_rejects_unknown_role() {
        let res = serde_json::from_str::<CreateUserRequest>(
            r#"{"rut":"1-9","email":"a@b.cl","password":"x","role":"guest",
                "first_name":"A","last_name":"B"}"#,
        );
        assert!(res.is_err());
    }
}
