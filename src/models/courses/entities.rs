use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: i64,
    pub institution_id: i64,
    /// `teachers.id`, not a user id
    pub teacher_id: Option<i64>,
    pub name: String,
    pub code: String,
    pub level: Option<String>,
    pub year: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
