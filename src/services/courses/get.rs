use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CourseService, course_not_found};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;

pub async fn get_course(
    service: &CourseService,
    course_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_course_by_id(course_id).await {
        Ok(Some(course)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            course,
            "Curso obtenido correctamente",
        ))),
        Ok(None) => Ok(course_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener el curso: {e}"),
        )),
    }
}
