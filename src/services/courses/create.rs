use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::validation::{check_code, check_level, check_name, check_references, check_year, invalid};
use super::{CourseService, course_conflict};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode, activity::entities::ActivityAction,
    courses::requests::CreateCourseRequest,
};
use crate::services::{ActivityLogger, internal_error};

fn normalize(data: CreateCourseRequest) -> Result<CreateCourseRequest, &'static str> {
    let level = match data.level {
        Some(ref level) => check_level(level)?,
        None => None,
    };

    Ok(CreateCourseRequest {
        institution_id: data.institution_id,
        teacher_id: data.teacher_id,
        name: check_name(&data.name)?,
        code: check_code(&data.code)?,
        level,
        year: check_year(data.year)?,
    })
}

pub async fn create_course(
    service: &CourseService,
    data: CreateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let data = match normalize(data) {
        Ok(data) => data,
        Err(msg) => return Ok(invalid(msg)),
    };

    let storage = service.get_storage(request)?;
    if let Err(response) =
        check_references(storage.as_ref(), Some(data.institution_id), data.teacher_id).await
    {
        return Ok(response);
    }

    match storage.create_course(data).await {
        Ok(course) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                RequireJWT::extract_user_id(request),
                ActivityAction::CourseCreated,
                format!("Curso {} creado", course.code),
                Some(json!({
                    "course_id": course.id,
                    "code": course.code,
                    "institution_id": course.institution_id,
                })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(course, "Curso creado")))
        }
        Err(e) if e.is_unique_violation() => Ok(course_conflict()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al crear el curso: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_course() {
        let data = normalize(CreateCourseRequest {
            institution_id: 1,
            teacher_id: None,
            name: " Segundo Medio A ".into(),
            code: "2ma-2025".into(),
            level: Some("".into()),
            year: 2025,
        })
        .unwrap();
        assert_eq!(data.name, "Segundo Medio A");
        assert_eq!(data.code, "2MA-2025");
        assert_eq!(data.level, None);
    }

    #[test]
    fn test_normalize_rejects_year() {
        let res = normalize(CreateCourseRequest {
            institution_id: 1,
            teacher_id: None,
            name: "Curso".into(),
            code: "C1".into(),
            level: None,
            year: 1990,
        });
        assert!(res.is_err());
    }
}
