use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use crate::middlewares::RequireJWT;
use crate::models::auth::requests::{
    ChangePasswordRequest, UpdateNotificationsRequest, UpdateProfileRequest,
};
use crate::models::auth::responses::NotificationPreferences;
use crate::models::users::requests::UserUpdate;
use crate::models::{ApiResponse, ErrorCode, activity::entities::ActivityAction};
use crate::services::users::validation::{check_email, check_name, check_password, check_phone};
use crate::services::{ActivityLogger, evict_cached_user, internal_error, unauthorized};
use crate::utils::password::{hash_password, verify_password};

use super::AuthService;

fn user_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::UserNotFound,
        "Usuario no encontrado",
    ))
}

/// Checks the self-editable fields; role, status and balance are never touched here
fn profile_update(update: &UpdateProfileRequest) -> Result<UserUpdate, HttpResponse> {
    let mut changes = UserUpdate::default();

    if let Some(ref email) = update.email {
        changes.email = Some(check_email(email).map_err(|e| e.bad_request())?);
    }
    if let Some(ref phone) = update.phone {
        changes.phone = Some(
            check_phone(Some(phone))
                .map_err(|e| e.bad_request())?
                .unwrap_or_default(),
        );
    }
    if let Some(ref first_name) = update.first_name {
        changes.first_name = Some(check_name("first_name", first_name).map_err(|e| e.bad_request())?);
    }
    if let Some(ref last_name) = update.last_name {
        changes.last_name = Some(check_name("last_name", last_name).map_err(|e| e.bad_request())?);
    }
    if let Some(ref avatar_url) = update.avatar_url {
        let avatar_url = avatar_url.trim();
        if avatar_url.len() > 500 {
            return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "La URL del avatar es demasiado larga",
            )));
        }
        changes.avatar_url = Some(avatar_url.to_string());
    }

    Ok(changes)
}

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let changes = match profile_update(&update_data) {
        Ok(changes) => changes,
        Err(response) => return Ok(response),
    };

    let storage = service.get_storage(request)?;

    if let Some(ref email) = changes.email {
        match storage.get_user_by_email(email).await {
            Ok(Some(existing)) if existing.id != user_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "El correo ya está registrado",
                )));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::UserUpdateFailed,
                    format!("Error al verificar el correo: {e}"),
                ));
            }
        }
    }

    let changed_fields: Vec<&str> = [
        ("email", changes.email.is_some()),
        ("phone", changes.phone.is_some()),
        ("first_name", changes.first_name.is_some()),
        ("last_name", changes.last_name.is_some()),
        ("avatar_url", changes.avatar_url.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, changed)| changed.then_some(field))
    .collect();

    match storage.update_user(user_id, changes).await {
        Ok(Some(user)) => {
            evict_cached_user(request, user_id).await;
            ActivityLogger::record(
                storage.as_ref(),
                request,
                Some(user_id),
                ActivityAction::ProfileUpdated,
                "Perfil actualizado",
                Some(json!({ "fields": changed_fields })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(user, "Perfil actualizado")))
        }
        Ok(None) => Ok(user_not_found()),
        Err(e) if e.is_unique_violation() => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "El correo ya está registrado"),
        )),
        Err(e) => Ok(internal_error(
            ErrorCode::UserUpdateFailed,
            format!("Error al actualizar el perfil: {e}"),
        )),
    }
}

pub async fn handle_change_password(
    service: &AuthService,
    password_request: ChangePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    if let Err(e) = check_password(&password_request.new_password) {
        return Ok(e.bad_request());
    }

    let storage = service.get_storage(request)?;
    // the cached user carries no password hash
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(user_not_found()),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener el usuario: {e}"),
            ));
        }
    };

    if !verify_password(&password_request.current_password, &user.password_hash) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::PasswordMismatch,
            "La contraseña actual es incorrecta",
        )));
    }

    if password_request.current_password == password_request.new_password {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserPasswordInvalid,
            "La nueva contraseña debe ser distinta de la actual",
        )));
    }

    let password_hash = match hash_password(&password_request.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al procesar la contraseña: {e}"),
            ));
        }
    };

    let changes = UserUpdate {
        password_hash: Some(password_hash),
        ..Default::default()
    };

    match storage.update_user(user_id, changes).await {
        Ok(Some(_)) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                Some(user_id),
                ActivityAction::PasswordChanged,
                "Contraseña actualizada",
                None,
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Contraseña actualizada")))
        }
        Ok(None) => Ok(user_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::UserUpdateFailed,
            format!("Error al actualizar la contraseña: {e}"),
        )),
    }
}

pub async fn handle_get_notifications(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let storage = service.get_storage(request)?;
    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            NotificationPreferences::from(&user),
            "Preferencias obtenidas",
        ))),
        Ok(None) => Ok(user_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener las preferencias: {e}"),
        )),
    }
}

pub async fn handle_update_notifications(
    service: &AuthService,
    notifications: UpdateNotificationsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let changes = UserUpdate {
        email_notifications: notifications.email_notifications,
        transfer_notifications: notifications.transfer_notifications,
        ..Default::default()
    };

    let storage = service.get_storage(request)?;
    match storage.update_user(user_id, changes).await {
        Ok(Some(user)) => {
            evict_cached_user(request, user_id).await;
            let preferences = NotificationPreferences::from(&user);
            ActivityLogger::record(
                storage.as_ref(),
                request,
                Some(user_id),
                ActivityAction::NotificationsUpdated,
                "Preferencias de notificación actualizadas",
                Some(json!({
                    "email_notifications": preferences.email_notifications,
                    "transfer_notifications": preferences.transfer_notifications,
                })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                preferences,
                "Preferencias actualizadas",
            )))
        }
        Ok(None) => Ok(user_not_found()),
        Err(e) => Ok(internal_error(
            ErrorCode::UserUpdateFailed,
            format!("Error al actualizar las preferencias: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_normalizes() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"email":" Nuevo@Mail.CL ","phone":"+56 9 8765 4321","first_name":" Eva "}"#,
        )
        .unwrap();
        let changes = profile_update(&req).unwrap();
        assert_eq!(changes.email.as_deref(), Some("nuevo@mail.cl"));
        assert_eq!(changes.phone.as_deref(), Some("+56987654321"));
        assert_eq!(changes.first_name.as_deref(), Some("Eva"));
        assert!(changes.role.is_none());
        assert!(changes.status.is_none());
    }

    #[test]
    fn test_profile_update_rejects_bad_email() {
        let req: UpdateProfileRequest = serde_json::from_str(r#"{"email":"nope"}"#).unwrap();
        let response = profile_update(&req).unwrap_err();
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
