pub mod export;
pub mod list;
pub mod logger;

pub use logger::ActivityLogger;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::activity::requests::ActivityListParams;
use crate::storage::Storage;

pub struct ActivityService {
    storage: Option<Arc<dyn Storage>>,
}

impl ActivityService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    /// Caller's own activity
    pub async fn list_own(
        &self,
        params: ActivityListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_own_activity(self, params, request).await
    }

    pub async fn list_all(
        &self,
        params: ActivityListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_all_activity(self, params, request).await
    }

    pub async fn export(
        &self,
        params: ActivityListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        export::export_activity(self, params, request).await
    }
}
