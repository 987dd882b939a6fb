use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::middlewares::{self, RateLimit};
use crate::models::institutions::requests::{
    CreateInstitutionRequest, InstitutionListParams, UpdateInstitutionRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::InstitutionService;
use crate::utils::SafeIDI64;

static INSTITUTION_SERVICE: Lazy<InstitutionService> = Lazy::new(InstitutionService::new_lazy);

pub async fn list_institutions(
    req: HttpRequest,
    query: web::Query<InstitutionListParams>,
) -> ActixResult<HttpResponse> {
    INSTITUTION_SERVICE
        .list_institutions(query.into_inner(), &req)
        .await
}

pub async fn get_institution(
    req: HttpRequest,
    institution_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    INSTITUTION_SERVICE
        .get_institution(institution_id.0, &req)
        .await
}

pub async fn create_institution(
    req: HttpRequest,
    data: web::Json<CreateInstitutionRequest>,
) -> ActixResult<HttpResponse> {
    INSTITUTION_SERVICE
        .create_institution(data.into_inner(), &req)
        .await
}

pub async fn update_institution(
    req: HttpRequest,
    institution_id: SafeIDI64,
    data: web::Json<UpdateInstitutionRequest>,
) -> ActixResult<HttpResponse> {
    INSTITUTION_SERVICE
        .update_institution(institution_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_institution(
    req: HttpRequest,
    institution_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    INSTITUTION_SERVICE
        .delete_institution(institution_id.0, &req)
        .await
}

// Reads are open to any signed-in user, writes need an admin
pub fn configure_institution_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/institutions")
            .wrap(RateLimit::api(&AppConfig::get().rate_limit))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_institutions))
            .route("/{id}", web::get().to(get_institution))
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::post().to(create_institution)),
            )
            .service(
                web::resource("/{id}")
                    .guard(guard::Any(guard::Put()).or(guard::Delete()))
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::put().to(update_institution))
                    .route(web::delete().to(delete_institution)),
            ),
    );
}
