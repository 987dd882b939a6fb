use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, student_not_found};
use crate::models::{
    ApiResponse, ErrorCode,
    courses::entities::Course,
    students::{entities::Student, requests::UpdateStudentRequest},
};
use crate::services::internal_error;

const ENROLLMENT_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

/// Resolves the final assignment; a course alone also sets its institution
fn resolve_assignment(
    student: &Student,
    data: &UpdateStudentRequest,
    course: Option<&Course>,
) -> Result<UpdateStudentRequest, &'static str> {
    if let Some(year) = data.enrollment_year
        && !ENROLLMENT_YEARS.contains(&year)
    {
        return Err("El año de ingreso debe estar entre 2000 y 2100");
    }

    let mut resolved = data.clone();
    if let Some(course) = course {
        let institution_id = data.institution_id.or(student.institution_id);
        match institution_id {
            Some(id) if id != course.institution_id => {
                return Err("El curso no pertenece a la institución del estudiante");
            }
            Some(_) => {}
            None => resolved.institution_id = Some(course.institution_id),
        }
    } else if let Some(institution_id) = data.institution_id
        && student.course_id.is_some()
        && student.institution_id != Some(institution_id)
    {
        return Err("Debe indicar un curso de la nueva institución");
    }

    Ok(resolved)
}

pub async fn update_student(
    service: &StudentService,
    student_id: i64,
    data: UpdateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let student = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return Ok(student_not_found()),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener el estudiante: {e}"),
            ));
        }
    };

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

    let course = match data.course_id {
        Some(course_id) => match storage.get_course_by_id(course_id).await {
            Ok(Some(course)) => Some(course),
            Ok(None) => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::CourseNotFound,
                    "El curso indicado no existe",
                )));
            }
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::InternalServerError,
                    format!("Error al verificar el curso: {e}"),
                ));
            }
        },
        None => None,
    };

    let update = match resolve_assignment(&student, &data, course.as_ref()) {
        Ok(update) => update,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::CourseInvalid, msg)));
        }
    };

    match storage.update_student(student_id, update).await {
        Ok(Some(student)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            student,
            "Estudiante actualizado",
        ))),
        Ok(None) => Ok(student_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al actualizar el estudiante: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;

    fn student(institution_id: Option<i64>, course_id: Option<i64>) -> Student {
        let epoch = chrono::DateTime::from_timestamp(0, 0).unwrap();
        Student {
            id: 1,
            user_id: 10,
            rut: "12345678-5".into(),
            email: "ana@colegio.cl".into(),
            first_name: "Ana".into(),
            last_name: "Soto".into(),
            status: UserStatus::Active,
            balance: 0,
            institution_id,
            course_id,
            enrollment_year: None,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    fn course(id: i64, institution_id: i64) -> Course {
        let epoch = chrono::DateTime::from_timestamp(0, 0).unwrap();
        Course {
            id,
            institution_id,
            teacher_id: None,
            name: "Primero A".into(),
            code: format!("C{id}"),
            level: None,
            year: 2025,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    #[test]
    fn test_course_sets_missing_institution() {
        let data = UpdateStudentRequest {
            course_id: Some(3),
            ..Default::default()
        };
        let resolved = resolve_assignment(&student(None, None), &data, Some(&course(3, 7))).unwrap();
        assert_eq!(resolved.institution_id, Some(7));
        assert_eq!(resolved.course_id, Some(3));
    }

    #[test]
    fn test_course_must_match_institution() {
        let data = UpdateStudentRequest {
            institution_id: Some(2),
            course_id: Some(3),
            ..Default::default()
        };
        assert!(resolve_assignment(&student(None, None), &data, Some(&course(3, 7))).is_err());

        let only_course = UpdateStudentRequest {
            course_id: Some(3),
            ..Default::default()
        };
        assert!(
            resolve_assignment(&student(Some(2), None), &only_course, Some(&course(3, 7))).is_err()
        );
    }

    #[test]
    fn test_institution_change_requires_new_course() {
        let data = UpdateStudentRequest {
            institution_id: Some(9),
            ..Default::default()
        };
        assert!(resolve_assignment(&student(Some(2), Some(3)), &data, None).is_err());
        assert!(resolve_assignment(&student(Some(2), None), &data, None).is_ok());
    }

    #[test]
    fn test_enrollment_year_range() {
        let data = UpdateStudentRequest {
            enrollment_year: Some(1980),
            ..Default::default()
        };
        assert!(resolve_assignment(&student(None, None), &data, None).is_err());
    }
}
