use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, activity::entities::ActivityAction};
use crate::services::{ActivityLogger, evict_cached_user};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

/// Clears the refresh cookie and drops the cached user
pub async fn handle_logout(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(user_id) = RequireJWT::extract_user_id(request) {
        evict_cached_user(request, user_id).await;
        let storage = service.get_storage(request)?;
        ActivityLogger::record(
            storage.as_ref(),
            request,
            Some(user_id),
            ActivityAction::Logout,
            "Cierre de sesión",
            None,
        )
        .await;
    }

    // max_age=0 makes the browser drop the cookie
    let empty_cookie = JwtUtils::create_empty_refresh_token_cookie();

    Ok(HttpResponse::Ok()
        .cookie(empty_cookie)
        .json(ApiResponse::<()>::success_empty("Sesión cerrada")))
}
