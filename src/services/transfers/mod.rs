pub mod create;
pub mod detail;
pub mod list;
pub mod plan;
pub mod stats;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::transfers::requests::{
    CreateTransferRequest, RecipientSearchParams, TransferListParams,
};
use crate::storage::Storage;

pub struct TransferService {
    storage: Option<Arc<dyn Storage>>,
}

impl TransferService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn create_transfer(
        &self,
        data: CreateTransferRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_transfer(self, data, request).await
    }

    pub async fn list_transfers(
        &self,
        query: TransferListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_transfers(self, query, request).await
    }

    pub async fn get_transfer(
        &self,
        transfer_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        detail::get_transfer(self, transfer_id, request).await
    }

    pub async fn get_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        stats::get_stats(self, request).await
    }

    pub async fn search_recipients(
        &self,
        query: RecipientSearchParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        stats::search_recipients(self, query, request).await
    }
}
