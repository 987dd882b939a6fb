use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{TeacherService, teacher_not_found};
use crate::models::{ApiResponse, ErrorCode, teachers::requests::UpdateTeacherRequest};
use crate::services::internal_error;

const MAX_SPECIALTY_LEN: usize = 100;

fn check_specialty(raw: &str) -> Result<String, &'static str> {
    let specialty = raw.trim();
    if specialty.chars().count() > MAX_SPECIALTY_LEN {
        return Err("La especialidad no puede superar los 100 caracteres");
    }
    Ok(specialty.to_string())
}

pub async fn update_teacher(
    service: &TeacherService,
    teacher_id: i64,
    data: UpdateTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let specialty = match data.specialty.as_deref().map(check_specialty).transpose() {
        Ok(specialty) => specialty,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
    };

    let storage = service.get_storage(request)?;

    if let Some(institution_id) = data.institution_id {
        match storage.get_institution_by_id(institution_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::InstitutionNotFound,
                    "La institución indicada no existe",
                )));
            }
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::InternalServerError,
                    format!("Error al verificar la institución: {e}"),
                ));
            }
        }
    }

    let update = UpdateTeacherRequest {
        institution_id: data.institution_id,
        specialty,
    };

    match storage.update_teacher(teacher_id, update).await {
        Ok(Some(teacher)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            teacher,
            "Profesor actualizado",
        ))),
        Ok(None) => Ok(teacher_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al actualizar el profesor: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialty_trimmed_and_bounded() {
        assert_eq!(check_specialty("  Matemática ").unwrap(), "Matemática");
        assert!(check_specialty(&"a".repeat(101)).is_err());
    }
}
