use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::middlewares::{self, RateLimit};
use crate::models::auth::requests::{
    ChangePasswordRequest, LoginRequest, UpdateNotificationsRequest, UpdateProfileRequest,
};
use crate::services::AuthService;

static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(
    req: HttpRequest,
    user_data: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(user_data.into_inner(), &req).await
}

pub async fn refresh_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&request).await
}

pub async fn logout(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout(&request).await
}

pub async fn verify_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.verify_token(&request).await
}

pub async fn get_user(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.get_user(&request).await
}

pub async fn update_profile(
    request: HttpRequest,
    update_data: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .update_profile(update_data.into_inner(), &request)
        .await
}

pub async fn change_password(
    request: HttpRequest,
    password_data: web::Json<ChangePasswordRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .change_password(password_data.into_inner(), &request)
        .await
}

pub async fn get_notifications(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.get_notifications(&request).await
}

pub async fn update_notifications(
    request: HttpRequest,
    notifications: web::Json<UpdateNotificationsRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .update_notifications(notifications.into_inner(), &request)
        .await
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    let limits = &AppConfig::get().rate_limit;

    cfg.service(
        web::scope("/api/v1/auth")
            // public, rate limited per IP
            .service(
                web::resource("/login")
                    .wrap(RateLimit::login(limits))
                    .route(web::post().to(login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(RateLimit::refresh_token(limits))
                    .route(web::post().to(refresh_token)),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT) // everything below needs a session
                    .route("/logout", web::post().to(logout))
                    .route("/verify-token", web::get().to(verify_token))
                    .route("/me", web::get().to(get_user))
                    .route("/me", web::put().to(update_profile))
                    .route("/me/password", web::put().to(change_password))
                    .route("/me/notifications", web::get().to(get_notifications))
                    .route("/me/notifications", web::put().to(update_notifications)),
            ),
    );
}
