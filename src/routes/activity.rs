use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::middlewares::{self, RateLimit};
use crate::models::activity::requests::ActivityListParams;
use crate::models::users::entities::UserRole;
use crate::services::ActivityService;

static ACTIVITY_SERVICE: Lazy<ActivityService> = Lazy::new(ActivityService::new_lazy);

pub async fn list_own(
    req: HttpRequest,
    query: web::Query<ActivityListParams>,
) -> ActixResult<HttpResponse> {
    ACTIVITY_SERVICE.list_own(query.into_inner(), &req).await
}

pub async fn list_all(
    req: HttpRequest,
    query: web::Query<ActivityListParams>,
) -> ActixResult<HttpResponse> {
    ACTIVITY_SERVICE.list_all(query.into_inner(), &req).await
}

pub async fn export(
    req: HttpRequest,
    query: web::Query<ActivityListParams>,
) -> ActixResult<HttpResponse> {
    ACTIVITY_SERVICE.export(query.into_inner(), &req).await
}

pub fn configure_activity_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/activity")
            .wrap(RateLimit::api(&AppConfig::get().rate_limit))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_own))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("/all", web::get().to(list_all))
                    .route("/export", web::get().to(export)),
            ),
    );
}
