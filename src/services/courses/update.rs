use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::validation::{check_code, check_level, check_name, check_references, check_year, invalid};
use super::{CourseService, course_conflict, course_not_found};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityAction,
    courses::{entities::Course, requests::UpdateCourseRequest},
    users::entities::UserRole,
};
use crate::services::{ActivityLogger, internal_error, unauthorized};
use crate::storage::Storage;

fn normalize(data: UpdateCourseRequest) -> Result<UpdateCourseRequest, &'static str> {
    Ok(UpdateCourseRequest {
        institution_id: data.institution_id,
        teacher_id: data.teacher_id,
        name: data.name.as_deref().map(check_name).transpose()?,
        code: data.code.as_deref().map(check_code).transpose()?,
        level: data
            .level
            .as_deref()
            .map(check_level)
            .transpose()?
            .map(|level| level.unwrap_or_default()),
        year: data.year.map(check_year).transpose()?,
    })
}

fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(ErrorCode::Forbidden, message))
}

/// Teachers may edit the courses they teach, without moving them
async fn check_teacher_access(
    storage: &dyn Storage,
    user_id: i64,
    course: &Course,
    data: &UpdateCourseRequest,
) -> Result<(), HttpResponse> {
    let teacher = match storage.get_teacher_by_user_id(user_id).await {
        Ok(Some(teacher)) => teacher,
        Ok(None) => return Err(forbidden("No tiene un perfil de profesor")),
        Err(e) => {
            return Err(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener el profesor: {e}"),
            ));
        }
    };

    if course.teacher_id != Some(teacher.id) {
        return Err(forbidden("Solo puede editar los cursos que imparte"));
    }
    if data.institution_id.is_some() || data.teacher_id.is_some() {
        return Err(forbidden(
            "Solo un administrador puede cambiar la institución o el profesor del curso",
        ));
    }
    Ok(())
}

pub async fn update_course(
    service: &CourseService,
    course_id: i64,
    data: UpdateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let data = match normalize(data) {
        Ok(data) => data,
        Err(msg) => return Ok(invalid(msg)),
    };

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

    if RequireJWT::extract_user_role(request) != Some(UserRole::Admin)
        && let Err(response) = check_teacher_access(storage.as_ref(), user_id, &course, &data).await
    {
        return Ok(response);
    }

    if let Err(response) =
        check_references(storage.as_ref(), data.institution_id, data.teacher_id).await
    {
        return Ok(response);
    }

    match storage.update_course(course_id, data).await {
        Ok(Some(course)) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                Some(user_id),
                ActivityAction::CourseUpdated,
                format!("Curso {} actualizado", course.code),
                Some(json!({ "course_id": course.id, "code": course.code })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(course, "Curso actualizado")))
        }
        Ok(None) => Ok(course_not_found()),
        Err(e) if e.is_unique_violation() => Ok(course_conflict()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al actualizar el curso: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::institutions::requests::CreateInstitutionRequest;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, new_user};

    #[test]
    fn test_normalize_blank_level_clears() {
        let data = normalize(UpdateCourseRequest {
            level: Some(" ".into()),
            code: Some("3b".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(data.level.as_deref(), Some(""));
        assert_eq!(data.code.as_deref(), Some("3B"));
        assert!(data.name.is_none());
    }

    #[tokio::test]
    async fn test_teacher_access_limited_to_own_course() {
        let storage = memory_storage().await;
        let owner = storage
            .create_user(new_user(12345678, UserRole::Teacher, 0))
            .await
            .unwrap()
            .id;
        let other = storage
            .create_user(new_user(7654321, UserRole::Teacher, 0))
            .await
            .unwrap()
            .id;
        let owner_teacher = storage.get_teacher_by_user_id(owner).await.unwrap().unwrap();

        let institution = storage
            .create_institution(CreateInstitutionRequest {
                name: "Liceo".into(),
                rut: None,
                address: None,
                phone: None,
                email: None,
            })
            .await
            .unwrap();
        let course = storage
            .create_course(CreateCourseRequest {
                institution_id: institution.id,
                teacher_id: Some(owner_teacher.id),
                name: "Primero A".into(),
                code: "1A".into(),
                level: None,
                year: 2025,
            })
            .await
            .unwrap();

        let rename = UpdateCourseRequest {
            name: Some("Primero A (tarde)".into()),
            ..Default::default()
        };
        assert!(
            check_teacher_access(&storage, owner, &course, &rename)
                .await
                .is_ok()
        );

        let denied = check_teacher_access(&storage, other, &course, &rename)
            .await
            .unwrap_err();
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let reassign = UpdateCourseRequest {
            teacher_id: Some(owner_teacher.id),
            ..Default::default()
        };
        assert!(
            check_teacher_access(&storage, owner, &course, &reassign)
                .await
                .is_err()
        );
    }
}
