pub mod health;
pub mod settings;
pub mod settings_cache;
pub mod stats;

pub use settings_cache::DynamicConfig;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::system::requests::UpdateConfigRequest;
use crate::storage::Storage;

pub struct SystemService {
    storage: Option<Arc<dyn Storage>>,
}

impl SystemService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    pub async fn health(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        health::health(self, request).await
    }

    pub async fn get_public_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_public_settings(self, request).await
    }

    pub async fn list_config(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::list_config(self, request).await
    }

    pub async fn update_config(
        &self,
        key: String,
        data: UpdateConfigRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        settings::update_config(self, key, data, request).await
    }

    pub async fn get_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        stats::get_stats(self, request).await
    }
}
