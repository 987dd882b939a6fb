use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::middlewares::{self, RateLimit};
use crate::models::PaginationQuery;
use crate::models::courses::requests::{CourseListParams, CreateCourseRequest, UpdateCourseRequest};
use crate::models::users::entities::UserRole;
use crate::services::CourseService;
use crate::utils::SafeIDI64;

static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseListParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(query.into_inner(), &req).await
}

pub async fn get_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(course_id.0, &req).await
}

pub async fn list_course_students(
    req: HttpRequest,
    course_id: SafeIDI64,
    query: web::Query<PaginationQuery>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .list_course_students(course_id.0, query.into_inner(), &req)
        .await
}

pub async fn create_course(
    req: HttpRequest,
    data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(data.into_inner(), &req).await
}

pub async fn update_course(
    req: HttpRequest,
    course_id: SafeIDI64,
    data: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(course_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(course_id.0, &req).await
}

// Teachers may edit only their own courses; the service checks ownership
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(RateLimit::api(&AppConfig::get().rate_limit))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_courses))
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::post().to(create_course)),
            )
            .service(
                web::resource("/{id}/students")
                    .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
                    .route(web::get().to(list_course_students)),
            )
            .route("/{id}", web::get().to(get_course))
            .service(
                web::resource("/{id}")
                    .guard(guard::Put())
                    .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
                    .route(web::put().to(update_course)),
            )
            .service(
                web::resource("/{id}")
                    .guard(guard::Delete())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::delete().to(delete_course)),
            ),
    );
}
