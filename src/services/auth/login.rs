use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use tracing::{error, info};

use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityAction,
    auth::{requests::LoginRequest, responses::LoginResponse},
    users::entities::User,
};
use crate::services::{ActivityLogger, DynamicConfig, internal_error};
use crate::storage::Storage;
use crate::utils::jwt;
use crate::utils::password::verify_password;
use crate::utils::rut::{looks_like_rut, normalize_rut};
use crate::utils::validate::normalize_email;

use super::AuthService;

const INVALID_CREDENTIALS: &str = "RUT/correo o contraseña incorrectos";

/// How a login identifier is looked up
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginIdentifier {
    Rut(String),
    Email(String),
    /// Neither a valid RUT nor an email, cannot match any account
    Unknown,
}

impl LoginIdentifier {
    pub(crate) fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains('@') {
            return LoginIdentifier::Email(normalize_email(raw));
        }
        if looks_like_rut(raw) {
            return match normalize_rut(raw) {
                Ok(rut) => LoginIdentifier::Rut(rut),
                Err(_) => LoginIdentifier::Unknown,
            };
        }
        LoginIdentifier::Unknown
    }
}

async fn find_user(
    storage: &dyn Storage,
    identifier: &LoginIdentifier,
) -> crate::errors::Result<Option<User>> {
    match identifier {
        LoginIdentifier::Rut(rut) => storage.get_user_by_rut(rut).await,
        LoginIdentifier::Email(email) => storage.get_user_by_email(email).await,
        LoginIdentifier::Unknown => Ok(None),
    }
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let identifier = LoginIdentifier::parse(&login_request.identifier);

    let user = match find_user(storage.as_ref(), &identifier).await {
        Ok(user) => user,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al iniciar sesión: {e}"),
            ));
        }
    };

    let user = match user {
        Some(user) if verify_password(&login_request.password, &user.password_hash) => user,
        // unknown account and wrong password look the same to the caller
        other => {
            info!("Failed login for identifier {:?}", identifier);
            ActivityLogger::record(
                storage.as_ref(),
                request,
                other.as_ref().map(|u| u.id),
                ActivityAction::LoginFailed,
                "Intento de inicio de sesión fallido",
                Some(json!({ "identifier": login_request.identifier.trim() })),
            )
            .await;
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::InvalidCredentials,
                INVALID_CREDENTIALS,
            )));
        }
    };

    if !user.is_active() {
        info!("Login refused for user {} with status {}", user.id, user.status);
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AccountInactive,
            "La cuenta no está activa, contacte al administrador",
        )));
    }

    // best effort
    if let Err(e) = storage.update_last_login(user.id).await {
        error!("Failed to update last login for user {}: {}", user.id, e);
    }

    // expiries come from system_config, editable at runtime
    let access_minutes = DynamicConfig::access_token_expiry().await;
    let refresh_days = if login_request.remember_me {
        DynamicConfig::refresh_token_remember_me_expiry().await
    } else {
        DynamicConfig::refresh_token_expiry().await
    };
    let refresh_expiry = chrono::Duration::days(refresh_days);

    let token_pair =
        match user.generate_token_pair(chrono::Duration::minutes(access_minutes), Some(refresh_expiry)) {
            Ok(pair) => pair,
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::InternalServerError,
                    format!("No se pudo generar el token: {e}"),
                ));
            }
        };

    info!("User {} logged in", user.id);
    ActivityLogger::record(
        storage.as_ref(),
        request,
        Some(user.id),
        ActivityAction::Login,
        "Inicio de sesión",
        Some(json!({ "remember_me": login_request.remember_me })),
    )
    .await;

    let refresh_cookie =
        jwt::JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token, refresh_expiry);

    // the stored row predates update_last_login
    let mut user = user;
    user.last_login = Some(chrono::Utc::now());

    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: access_minutes * 60,
        user,
        created_at: chrono::Utc::now(),
    };

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Inicio de sesión exitoso")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_kinds() {
        assert_eq!(
            LoginIdentifier::parse(" 12.345.678-5 "),
            LoginIdentifier::Rut("12345678-5".into())
        );
        assert_eq!(
            LoginIdentifier::parse("123456785"),
            LoginIdentifier::Rut("12345678-5".into())
        );
        assert_eq!(
            LoginIdentifier::parse("Ana@Colegio.CL"),
            LoginIdentifier::Email("ana@colegio.cl".into())
        );
        // wrong check digit
        assert_eq!(LoginIdentifier::parse("12.345.678-9"), LoginIdentifier::Unknown);
        assert_eq!(LoginIdentifier::parse("admin"), LoginIdentifier::Unknown);
    }
}
