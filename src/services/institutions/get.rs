use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{InstitutionService, institution_not_found};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;

pub async fn get_institution(
    service: &InstitutionService,
    institution_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_institution_by_id(institution_id).await {
        Ok(Some(institution)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            institution,
            "Institución obtenida correctamente",
        ))),
        Ok(None) => Ok(institution_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener la institución: {e}"),
        )),
    }
}
