use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::middlewares::{self, RateLimit};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{
    AdjustBalanceRequest, CreateUserRequest, UpdateUserRequest, UserListParams,
};
use crate::services::UserService;
use crate::utils::SafeIDI64;

static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    user_data: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(user_data.into_inner(), &req).await
}

pub async fn get_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(user_id.0, &req).await
}

pub async fn update_user(
    req: HttpRequest,
    user_id: SafeIDI64,
    update_data: web::Json<UpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_user(user_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn delete_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.delete_user(user_id.0, &req).await
}

pub async fn adjust_balance(
    req: HttpRequest,
    user_id: SafeIDI64,
    adjustment: web::Json<AdjustBalanceRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .adjust_balance(user_id.0, adjustment.into_inner(), &req)
        .await
}

pub async fn bulk_upload(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    USER_SERVICE.bulk_upload(payload, &req).await
}

pub async fn export_users(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.export_users(&req).await
}

pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    let limits = &AppConfig::get().rate_limit;

    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("", web::get().to(list_users))
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(RateLimit::register(limits)) // account creation quota
                            .route(web::post().to(create_user)),
                    )
                    .service(
                        web::resource("/bulk-upload")
                            .wrap(RateLimit::file_upload(limits))
                            .route(web::post().to(bulk_upload)),
                    )
                    // before /{id}
                    .route("/export", web::get().to(export_users))
                    .route("/{id}", web::get().to(get_user))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::delete().to(delete_user))
                    .route("/{id}/balance", web::put().to(adjust_balance)),
            ),
    );
}
