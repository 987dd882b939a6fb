use super::entities::Institution;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/institution.ts")]
pub struct InstitutionListResponse {
    pub items: Vec<Institution>,
    pub pagination: PaginationInfo,
}
