use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::middlewares::RequireJWT;
use crate::models::auth::responses::{RefreshTokenResponse, TokenVerificationResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{DynamicConfig, internal_error, unauthorized};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

fn expired_session() -> HttpResponse {
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::TokenInvalid,
            "La sesión expiró o no es válida, inicie sesión nuevamente",
        ))
}

/// New access token from the `refresh_token` cookie.
///
/// The account is re-read so a deactivated user cannot keep refreshing.
pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::RefreshTokenMissing,
            "No hay una sesión activa, inicie sesión",
        )));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            info!("Refresh token rejected: {}", e);
            return Ok(expired_session());
        }
    };

    let Some(user_id) = claims.user_id() else {
        return Ok(expired_session());
    };

    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active() => user,
        Ok(_) => {
            info!("Refresh refused for missing or inactive user {}", user_id);
            return Ok(expired_session());
        }
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al renovar la sesión: {e}"),
            ));
        }
    };

    let access_minutes = DynamicConfig::access_token_expiry().await;
    match JwtUtils::generate_access_token(
        user.id,
        &user.role.to_string(),
        chrono::Duration::minutes(access_minutes),
    ) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: access_minutes * 60,
            },
            "Sesión renovada",
        ))),
        Err(e) => {
            error!("Access token generation failed: {}", e);
            Ok(internal_error(
                ErrorCode::InternalServerError,
                "No se pudo renovar la sesión",
            ))
        }
    }
}

pub async fn handle_verify_token(
    _service: &AuthService,
    _request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TokenVerificationResponse { is_valid: true },
        "Token válido",
    )))
}

/// Current user, read from storage so the balance is never stale
pub async fn handle_get_user(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let storage = service.get_storage(request)?;
    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            user,
            "Usuario obtenido correctamente",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Usuario no encontrado",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener el usuario: {e}"),
        )),
    }
}
