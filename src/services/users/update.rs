use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::UserService;
use super::validation::{FieldError, check_email, check_name, check_password, check_phone};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityAction,
    users::requests::{UpdateUserRequest, UserUpdate},
};
use crate::services::{ActivityLogger, evict_cached_user, internal_error};
use crate::utils::password::hash_password;

/// Validated changes; the password is still plain text
fn admin_update(update: &UpdateUserRequest) -> Result<UserUpdate, FieldError> {
    let mut changes = UserUpdate {
        role: update.role.clone(),
        status: update.status.clone(),
        ..Default::default()
    };

    if let Some(ref email) = update.email {
        changes.email = Some(check_email(email)?);
    }
    if let Some(ref phone) = update.phone {
        changes.phone = Some(check_phone(Some(phone))?.unwrap_or_default());
    }
    if let Some(ref first_name) = update.first_name {
        changes.first_name = Some(check_name("first_name", first_name)?);
    }
    if let Some(ref last_name) = update.last_name {
        changes.last_name = Some(check_name("last_name", last_name)?);
    }
    if let Some(ref password) = update.password {
        check_password(password)?;
        changes.password_hash = Some(password.clone());
    }

    Ok(changes)
}

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let mut changes = match admin_update(&update_data) {
        Ok(changes) => changes,
        Err(e) => return Ok(e.bad_request()),
    };

    let current_user_id = RequireJWT::extract_user_id(request);
    if current_user_id == Some(user_id)
        && (changes.role.is_some() || changes.status.is_some())
    {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserUpdateFailed,
            "No puede cambiar su propio rol o estado",
        )));
    }

    if let Some(ref plain) = changes.password_hash {
        changes.password_hash = match hash_password(plain) {
            Ok(hash) => Some(hash),
            Err(e) => {
                return Ok(internal_error(
                    ErrorCode::InternalServerError,
                    format!("Error al procesar la contraseña: {e}"),
                ));
            }
        };
    }

    let metadata = json!({
        "user_id": user_id,
        "email": changes.email.is_some(),
        "phone": changes.phone.is_some(),
        "names": changes.first_name.is_some() || changes.last_name.is_some(),
        "password": changes.password_hash.is_some(),
        "role": changes.role,
        "status": changes.status,
    });

    let storage = service.get_storage(request)?;
    match storage.update_user(user_id, changes).await {
        Ok(Some(user)) => {
            evict_cached_user(request, user_id).await;
            ActivityLogger::record(
                storage.as_ref(),
                request,
                current_user_id,
                ActivityAction::UserUpdated,
                format!("Usuario {} actualizado", user.rut),
                Some(metadata),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(user, "Usuario actualizado")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Usuario no encontrado",
        ))),
        Err(e) if e.is_unique_violation() => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "El correo ya está registrado"),
        )),
        Err(e) => Ok(internal_error(
            ErrorCode::UserUpdateFailed,
            format!("Error al actualizar el usuario: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserRole, UserStatus};

    #[test]
    fn test_admin_update_fields() {
        let req: UpdateUserRequest = serde_json::from_str(
            r#"{"role":"teacher","status":"suspended","last_name":" Rojas "}"#,
        )
        .unwrap();
        let changes = admin_update(&req).unwrap();
        assert_eq!(changes.role, Some(UserRole::Teacher));
        assert_eq!(changes.status, Some(UserStatus::Suspended));
        assert_eq!(changes.last_name.as_deref(), Some("Rojas"));
        assert!(changes.password_hash.is_none());
    }

    #[test]
    fn test_admin_update_enforces_password_policy() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"password":"abc"}"#).unwrap();
        let err = admin_update(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::UserPasswordInvalid);
    }

    #[test]
    fn test_blank_phone_clears() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"phone":"  "}"#).unwrap();
        let changes = admin_update(&req).unwrap();
        assert_eq!(changes.phone.as_deref(), Some(""));

        let req: UpdateUserRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(admin_update(&req).unwrap().phone.is_none());
    }

    mod handler {
        use super::*;
        use crate::cache::ObjectCache;
        use crate::cache::object_cache::moka::MokaObjectCache;
        use crate::middlewares::require_jwt::resolve_user;
        use crate::storage::Storage;
        use crate::storage::sea_orm_storage::test_support::{memory_storage, new_user};
        use actix_web::{HttpMessage, test::TestRequest, web};
        use std::sync::Arc;

        struct Fixture {
            storage: Arc<dyn Storage>,
            cache: Arc<dyn ObjectCache>,
            admin: crate::models::users::entities::User,
        }

        async fn fixture() -> Fixture {
            let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
            let cache: Arc<dyn ObjectCache> = Arc::new(MokaObjectCache::with_capacity(100, 300));
            let admin = storage
                .create_user(new_user(11111111, UserRole::Admin, 0))
                .await
                .unwrap();
            Fixture {
                storage,
                cache,
                admin,
            }
        }

        fn admin_request(f: &Fixture) -> HttpRequest {
            let req = TestRequest::default()
                .app_data(web::Data::new(f.storage.clone()))
                .app_data(web::Data::new(f.cache.clone()))
                .to_http_request();
            req.extensions_mut().insert(f.admin.clone());
            req
        }

        #[tokio::test]
        async fn test_suspended_user_loses_cached_session() {
            let f = fixture().await;
            let student = f
                .storage
                .create_user(new_user(12345678, UserRole::Student, 0))
                .await
                .unwrap();

            // prime the cache as an authenticated request would
            resolve_user(student.id, f.cache.as_ref(), f.storage.as_ref(), 300)
                .await
                .unwrap();

            let body: UpdateUserRequest =
                serde_json::from_str(r#"{"status":"suspended"}"#).unwrap();
            let resp = update_user(&UserService::new_lazy(), student.id, body, &admin_request(&f))
                .await
                .unwrap();
            assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

            let err = resolve_user(student.id, f.cache.as_ref(), f.storage.as_ref(), 300)
                .await
                .unwrap_err();
            assert_eq!(err, "La cuenta no está activa");
        }

        #[tokio::test]
        async fn test_role_change_reaches_next_request() {
            let f = fixture().await;
            let teacher = f
                .storage
                .create_user(new_user(22222222, UserRole::Teacher, 0))
                .await
                .unwrap();
            resolve_user(teacher.id, f.cache.as_ref(), f.storage.as_ref(), 300)
                .await
                .unwrap();

            let body: UpdateUserRequest = serde_json::from_str(r#"{"role":"student"}"#).unwrap();
            update_user(&UserService::new_lazy(), teacher.id, body, &admin_request(&f))
                .await
                .unwrap();

            let user = resolve_user(teacher.id, f.cache.as_ref(), f.storage.as_ref(), 300)
                .await
                .unwrap();
            assert_eq!(user.role, UserRole::Student);
        }

        #[tokio::test]
        async fn test_phone_can_be_cleared() {
            let f = fixture().await;
            let mut draft = new_user(12345678, UserRole::Student, 0);
            draft.phone = Some("+56912345678".into());
            let student = f.storage.create_user(draft).await.unwrap();

            let body: UpdateUserRequest = serde_json::from_str(r#"{"phone":""}"#).unwrap();
            update_user(&UserService::new_lazy(), student.id, body, &admin_request(&f))
                .await
                .unwrap();

            let stored = f.storage.get_user_by_id(student.id).await.unwrap().unwrap();
            assert_eq!(stored.phone, None);
        }
    }
}
