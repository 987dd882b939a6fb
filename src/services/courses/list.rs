use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{CourseService, course_not_found};
use crate::models::{
    ApiResponse, ErrorCode, PaginationQuery,
    courses::requests::{CourseListParams, CourseListQuery},
    students::requests::StudentListQuery,
};
use crate::services::internal_error;

pub async fn list_courses(
    service: &CourseService,
    query: CourseListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let list_query = CourseListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        institution_id: query.institution_id,
        teacher_id: query.teacher_id,
        search: query.search,
    };

    match storage.list_courses_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Cursos obtenidos correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al listar cursos: {e}"),
        )),
    }
}

/// Students enrolled in the course, joined with their accounts
pub async fn list_course_students(
    service: &CourseService,
    course_id: i64,
    pagination: PaginationQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_course_by_id(course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(course_not_found()),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener el curso: {e}"),
            ));
        }
    }

    let query = StudentListQuery {
        page: Some(pagination.page),
        size: Some(pagination.size),
        course_id: Some(course_id),
        ..Default::default()
    };

    match storage.list_students_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Estudiantes del curso obtenidos correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al listar estudiantes del curso: {e}"),
        )),
    }
}
