/*!
 * JWT authentication middleware.
 *
 * Validates `Authorization: Bearer <access token>`, resolves the account and
 * stores the `User` in the request extensions for handlers and `RequireRole`.
 *
 * ```rust,ignore
 * web::scope("/api/v1/transfers")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_transfers))
 * ```
 *
 * Resolved users are cached under `user:{id}` for `cache.default_ttl`
 * seconds. Admin edits and deletes evict that key. Balances must still be
 * read from storage, the cached copy goes stale after any transfer.
 */

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::users::entities::{self, UserRole};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;


#[derive(Clone)]
pub struct RequireJWT;

/// Cache key of a resolved user, evicted whenever an admin edits or deletes it
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

/// Active account for `user_id`, from the cache or else storage.
///
/// Cached copies that are no longer active fall through to storage.
pub(crate) async fn resolve_user(
    user_id: i64,
    cache: &dyn ObjectCache,
    storage: &dyn Storage,
    ttl: u64,
) -> Result<entities::User, String> {
    let cache_key = user_cache_key(user_id);
    match cache.get_raw(&cache_key).await {
        CacheResult::Found(json) => match serde_json::from_str::<entities::User>(&json) {
            Ok(user) if user.is_active() => {
                debug!("User {} resolved from cache", user.id);
                return Ok(user);
            }
            _ => cache.remove(&cache_key).await,
        },
        _ => debug!("User cache miss"),
    }

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", user_id, e);
            "No se pudo verificar el usuario".to_string()
        })?
        .ok_or_else(|| "Usuario no encontrado".to_string())?;

    if !user.is_active() {
        return Err("La cuenta no está activa".to_string());
    }

    // The password hash is not serialized, so cached users never carry it
    if let Ok(user_json) = serde_json::to_string(&user) {
        cache.insert_raw(cache_key, user_json, ttl).await;
    }

    Ok(user)
}

async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<entities::User, String> {
    let token = JwtUtils::extract_bearer_token(req.request())
        .ok_or_else(|| "Falta el encabezado Authorization".to_string())?;

    let claims = JwtUtils::verify_access_token(&token).map_err(|err| {
        info!("JWT validation failed: {}", err);
        "Token inválido o expirado".to_string()
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| "Token con usuario inválido".to_string())?;

    let cache = req
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .map(|c| c.get_ref().clone())
        .ok_or_else(|| {
            error!("Object cache missing from app data");
            "Servicio no disponible".to_string()
        })?;

    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage missing from app data");
            "Servicio no disponible".to_string()
        })?;

    resolve_user(
        user_id,
        cache.as_ref(),
        storage.as_ref(),
        AppConfig::get().cache.default_ttl,
    )
    .await
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            if req.method() == actix_web::http::Method::OPTIONS {
                let res = srv.call(req).await?.map_into_left_body();
                return Ok(res);
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!("Unauthenticated request to {}: {}", req.path(), err);
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("No autorizado: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// User placed in the extensions by the middleware
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<entities::User> {
        req.extensions().get::<entities::User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<entities::User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions()
            .get::<entities::User>()
            .map(|user| user.role.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, web};
    use actix_web::test as actix_test;

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let app = actix_test::init_service(
            App::new().service(
                web::scope("/p")
                    .wrap(RequireJWT)
                    .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/p").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::Unauthorized as i32);
    }

    #[test]
    fn test_user_cache_key() {
        assert_eq!(user_cache_key(42), "user:42");
    }

    #[tokio::test]
    async fn test_resolve_user_caches_and_rejects_inactive() {
        use crate::cache::object_cache::moka::MokaObjectCache;
        use crate::models::users::{entities::UserStatus, requests::UserUpdate};
        use crate::storage::sea_orm_storage::test_support::{memory_storage, new_user};

        let storage = memory_storage().await;
        let cache = MokaObjectCache::with_capacity(100, 300);
        let user = storage
            .create_user(new_user(12345678, UserRole::Student, 0))
            .await
            .unwrap();

        resolve_user(user.id, &cache, &storage, 300).await.unwrap();
        assert!(matches!(
            cache.get_raw(&user_cache_key(user.id)).await,
            CacheResult::Found(_)
        ));

        let suspend = UserUpdate {
            status: Some(UserStatus::Suspended),
            ..Default::default()
        };
        storage.update_user(user.id, suspend).await.unwrap();
        cache.remove(&user_cache_key(user.id)).await;

        let err = resolve_user(user.id, &cache, &storage, 300).await.unwrap_err();
        assert_eq!(err, "La cuenta no está activa");
        assert!(resolve_user(9999, &cache, &storage, 300).await.is_err());
    }
}
