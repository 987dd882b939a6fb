use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::config::AppConfig;
use crate::middlewares::{self, RateLimit};
use crate::models::transfers::requests::{
    CreateTransferRequest, RecipientSearchParams, TransferListParams,
};
use crate::services::TransferService;
use crate::utils::SafeIDI64;

static TRANSFER_SERVICE: Lazy<TransferService> = Lazy::new(TransferService::new_lazy);

pub async fn create_transfer(
    req: HttpRequest,
    data: web::Json<CreateTransferRequest>,
) -> ActixResult<HttpResponse> {
    TRANSFER_SERVICE.create_transfer(data.into_inner(), &req).await
}

pub async fn list_transfers(
    req: HttpRequest,
    query: web::Query<TransferListParams>,
) -> ActixResult<HttpResponse> {
    TRANSFER_SERVICE.list_transfers(query.into_inner(), &req).await
}

pub async fn get_transfer(req: HttpRequest, transfer_id: SafeIDI64) -> ActixResult<HttpResponse> {
    TRANSFER_SERVICE.get_transfer(transfer_id.0, &req).await
}

pub async fn get_stats(req: HttpRequest) -> ActixResult<HttpResponse> {
    TRANSFER_SERVICE.get_stats(&req).await
}

pub async fn search_recipients(
    req: HttpRequest,
    query: web::Query<RecipientSearchParams>,
) -> ActixResult<HttpResponse> {
    TRANSFER_SERVICE
        .search_recipients(query.into_inner(), &req)
        .await
}

pub fn configure_transfer_routes(cfg: &mut web::ServiceConfig) {
    let limits = &AppConfig::get().rate_limit;

    cfg.service(
        web::scope("/api/v1/transfers")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(RateLimit::transfer(limits)) // only POST counts against the transfer quota
                    .route(web::post().to(create_transfer)),
            )
            .route("", web::get().to(list_transfers))
            // static segments before /{id}
            .route("/stats", web::get().to(get_stats))
            .route("/recipients", web::get().to(search_recipients))
            .route("/{id}", web::get().to(get_transfer)),
    );
}
