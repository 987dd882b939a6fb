use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{InstitutionService, institution_not_found};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, activity::entities::ActivityAction};
use crate::services::{ActivityLogger, internal_error};

/// Courses go with the institution; students and teachers keep their rows
/// with the institution cleared.
pub async fn delete_institution(
    service: &InstitutionService,
    institution_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let institution = match storage.get_institution_by_id(institution_id).await {
        Ok(Some(institution)) => institution,
        Ok(None) => return Ok(institution_not_found()),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener la institución: {e}"),
            ));
        }
    };

    match storage.delete_institution(institution_id).await {
        Ok(true) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                RequireJWT::extract_user_id(request),
                ActivityAction::InstitutionDeleted,
                format!("Institución {} eliminada", institution.name),
                Some(json!({ "institution_id": institution.id, "name": institution.name })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Institución eliminada")))
        }
        Ok(false) => Ok(institution_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al eliminar la institución: {e}"),
        )),
    }
}
