use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "crate::models::common::query::optional_i64")]
    pub institution_id: Option<i64>,
    #[serde(default, deserialize_with = "crate::models::common::query::optional_i64")]
    pub teacher_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub institution_id: i64,
    pub teacher_id: Option<i64>,
    pub name: String,
    pub code: String,
    pub level: Option<String>,
    pub year: i32,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateCourseRequest {
    pub institution_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub level: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub institution_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub search: Option<String>,
}
