use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::system::requests::UpdateConfigRequest;
use crate::models::users::entities::UserRole;
use crate::services::SystemService;
use crate::utils::SafeConfigKey;

static SYSTEM_SERVICE: Lazy<SystemService> = Lazy::new(SystemService::new_lazy);

pub async fn health(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.health(&request).await
}

pub async fn get_settings(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_public_settings(&request).await
}

pub async fn list_config(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.list_config(&request).await
}

pub async fn update_config(
    request: HttpRequest,
    key: SafeConfigKey,
    data: web::Json<UpdateConfigRequest>,
) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE
        .update_config(key.0, data.into_inner(), &request)
        .await
}

pub async fn get_stats(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_stats(&request).await
}

pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/system")
            .route("/health", web::get().to(health)) // unauthenticated
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/settings", web::get().to(get_settings))
                    .service(
                        web::scope("")
                            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                            .route("/config", web::get().to(list_config))
                            .route("/config/{key}", web::put().to(update_config))
                            .route("/stats", web::get().to(get_stats)),
                    ),
            ),
    );
}
