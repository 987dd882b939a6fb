use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::entities::UserStatus;

/// Student row joined with the owning user account
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/student.ts")]
pub struct Student {
    pub id: i64,
    pub user_id: i64,
    pub rut: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub balance: i64,
    pub institution_id: Option<i64>,
    pub course_id: Option<i64>,
    pub enrollment_year: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
