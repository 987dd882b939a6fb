use actix_web::HttpResponse;

use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

const MAX_NAME_LEN: usize = 120;
const MAX_CODE_LEN: usize = 30;
const MAX_LEVEL_LEN: usize = 60;
pub(super) const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

pub(super) fn check_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("El nombre del curso es obligatorio");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("El nombre del curso no puede superar los 120 caracteres");
    }
    Ok(name.to_string())
}

/// Codes are compared uppercase, `2a-2025` and `2A-2025` are the same course
pub(super) fn check_code(raw: &str) -> Result<String, &'static str> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err("El código del curso es obligatorio");
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err("El código del curso no puede superar los 30 caracteres");
    }
    if code.chars().any(char::is_whitespace) {
        return Err("El código del curso no puede contener espacios");
    }
    Ok(code)
}

/// Blank level means none
pub(super) fn check_level(raw: &str) -> Result<Option<String>, &'static str> {
    let level = raw.trim();
    if level.chars().count() > MAX_LEVEL_LEN {
        return Err("El nivel no puede superar los 60 caracteres");
    }
    Ok(Some(level.to_string()).filter(|l| !l.is_empty()))
}

pub(super) fn check_year(year: i32) -> Result<i32, &'static str> {
    if !YEAR_RANGE.contains(&year) {
        return Err("El año del curso debe estar entre 2000 y 2100");
    }
    Ok(year)
}

pub(super) fn invalid(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::CourseInvalid, message))
}

/// Rejects references to a missing institution or teacher
pub(super) async fn check_references(
    storage: &dyn Storage,
    institution_id: Option<i64>,
    teacher_id: Option<i64>,
) -> Result<(), HttpResponse> {
    if let Some(institution_id) = institution_id {
        match storage.get_institution_by_id(institution_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::InstitutionNotFound,
                    "La institución indicada no existe",
                )));
            }
            Err(e) => {
                return Err(crate::services::internal_error(
                    ErrorCode::InternalServerError,
                    format!("Error al verificar la institución: {e}"),
                ));
            }
        }
    }

    if let Some(teacher_id) = teacher_id {
        match storage.get_teacher_by_id(teacher_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::TeacherNotFound,
                    "El profesor indicado no existe",
                )));
            }
            Err(e) => {
                return Err(crate::services::internal_error(
                    ErrorCode::InternalServerError,
                    format!("Error al verificar el profesor: {e}"),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_uppercased() {
        assert_eq!(check_code(" 2a-2025 ").unwrap(), "2A-2025");
        assert!(check_code("2 A").is_err());
        assert!(check_code("").is_err());
    }

    #[test]
    fn test_level_and_year() {
        assert_eq!(check_level("  ").unwrap(), None);
        assert_eq!(check_level(" 2° Medio ").unwrap().as_deref(), Some("2° Medio"));
        assert!(check_year(1999).is_err());
        assert_eq!(check_year(2025).unwrap(), 2025);
    }
}
