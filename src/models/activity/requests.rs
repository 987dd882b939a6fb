use super::entities::ActivityAction;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

/// `from` / `to` are inclusive `YYYY-MM-DD` dates (UTC)
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/activity.ts")]
pub struct ActivityListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub action: Option<ActivityAction>,
    #[serde(default, deserialize_with = "crate::models::common::query::optional_i64")]
    pub user_id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub user_id: Option<i64>,
    pub action: Option<ActivityAction>,
    /// Unix seconds, inclusive
    pub from: Option<i64>,
    /// Unix seconds, exclusive
    pub to: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub user_id: Option<i64>,
    pub action: ActivityAction,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
