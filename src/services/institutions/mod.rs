pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::institutions::requests::{
    CreateInstitutionRequest, InstitutionListParams, UpdateInstitutionRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct InstitutionService {
    storage: Option<Arc<dyn Storage>>,
}

impl InstitutionService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_institutions(
        &self,
        query: InstitutionListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_institutions(self, query, request).await
    }

    pub async fn get_institution(
        &self,
        institution_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_institution(self, institution_id, request).await
    }

    pub async fn create_institution(
        &self,
        data: CreateInstitutionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_institution(self, data, request).await
    }

    pub async fn update_institution(
        &self,
        institution_id: i64,
        data: UpdateInstitutionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_institution(self, institution_id, data, request).await
    }

    pub async fn delete_institution(
        &self,
        institution_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_institution(self, institution_id, request).await
    }
}

pub(crate) fn institution_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::InstitutionNotFound,
        "Institución no encontrada",
    ))
}

pub(crate) fn institution_conflict() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::InstitutionAlreadyExists,
        "Ya existe una institución con ese nombre o RUT",
    ))
}
