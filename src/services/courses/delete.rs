use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{CourseService, course_not_found};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, activity::entities::ActivityAction};
use crate::services::{ActivityLogger, internal_error};

/// Enrolled students stay, with their course cleared
pub async fn delete_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let course = match storage.get_course_by_id(course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => return Ok(course_not_found()),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener el curso: {e}"),
            ));
        }
    };

    match storage.delete_course(course_id).await {
        Ok(true) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                RequireJWT::extract_user_id(request),
                ActivityAction::CourseDeleted,
                format!("Curso {} eliminado", course.code),
                Some(json!({ "course_id": course.id, "code": course.code })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Curso eliminado")))
        }
        Ok(false) => Ok(course_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al eliminar el curso: {e}"),
        )),
    }
}
