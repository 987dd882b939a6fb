use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{TeacherService, teacher_not_found};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;

pub async fn get_teacher(
    service: &TeacherService,
    teacher_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_teacher_by_id(teacher_id).await {
        Ok(Some(teacher)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            teacher,
            "Profesor obtenido correctamente",
        ))),
        Ok(None) => Ok(teacher_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener el profesor: {e}"),
        )),
    }
}
