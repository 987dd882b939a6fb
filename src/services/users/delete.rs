use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::UserService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, activity::entities::ActivityAction};
use crate::services::{ActivityLogger, evict_cached_user, internal_error};

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current_user_id = RequireJWT::extract_user_id(request);
    if current_user_id == Some(user_id) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "No puede eliminar su propia cuenta",
        )));
    }

    let storage = service.get_storage(request)?;

    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "Usuario no encontrado",
            )));
        }
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::UserDeleteFailed,
                format!("Error al obtener el usuario: {e}"),
            ));
        }
    };

    match storage.delete_user(user_id).await {
        Ok(true) => {
            evict_cached_user(request, user_id).await;
            ActivityLogger::record(
                storage.as_ref(),
                request,
                current_user_id,
                ActivityAction::UserDeleted,
                format!("Usuario {} eliminado", user.rut),
                Some(json!({ "user_id": user.id, "rut": user.rut, "role": user.role })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Usuario eliminado")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Usuario no encontrado",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::UserDeleteFailed,
            format!("Error al eliminar el usuario: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCache;
    use crate::cache::object_cache::moka::MokaObjectCache;
    use crate::middlewares::require_jwt::resolve_user;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::test_support::{memory_storage, new_user};
    use actix_web::{HttpMessage, test::TestRequest, web};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_deleted_user_loses_cached_session() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaObjectCache::with_capacity(100, 300));
        let admin = storage
            .create_user(new_user(11111111, UserRole::Admin, 0))
            .await
            .unwrap();
        let student = storage
            .create_user(new_user(12345678, UserRole::Student, 0))
            .await
            .unwrap();
        resolve_user(student.id, cache.as_ref(), storage.as_ref(), 300)
            .await
            .unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .to_http_request();
        req.extensions_mut().insert(admin);

        let resp = delete_user(&UserService::new_lazy(), student.id, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

        let err = resolve_user(student.id, cache.as_ref(), storage.as_ref(), 300)
            .await
            .unwrap_err();
        assert_eq!(err, "Usuario no encontrado");
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let admin = storage
            .create_user(new_user(11111111, UserRole::Admin, 0))
            .await
            .unwrap();
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut().insert(admin.clone());

        let resp = delete_user(&UserService::new_lazy(), admin.id, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
