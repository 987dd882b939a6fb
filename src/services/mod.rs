pub mod activity;
pub mod auth;
pub mod courses;
pub mod institutions;
pub mod students;
pub mod system;
pub mod teachers;
pub mod transfers;
pub mod users;

pub use activity::{ActivityLogger, ActivityService};
pub use auth::AuthService;
pub use courses::CourseService;
pub use institutions::InstitutionService;
pub use students::StudentService;
pub use system::{DynamicConfig, SystemService};
pub use teachers::TeacherService;
pub use transfers::TransferService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// Storage registered in `app_data` by the server
pub(crate) fn storage_from_request(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            tracing::error!("Storage not found in app data");
            actix_web::error::ErrorInternalServerError("Storage not configured")
        })
}

pub(crate) fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Debe iniciar sesión",
    ))
}

pub(crate) fn internal_error(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    let message = message.into();
    tracing::error!("{}", message);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(code, message))
}

/// Drops the cached `User` of `user_id`, so the next request re-reads its
/// status, role and profile
pub(crate) async fn evict_cached_user(request: &HttpRequest, user_id: i64) {
    if let Some(cache) =
        request.app_data::<actix_web::web::Data<Arc<dyn crate::cache::ObjectCache>>>()
    {
        cache
            .remove(&crate::middlewares::user_cache_key(user_id))
            .await;
    }
}
