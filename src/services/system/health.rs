use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::error;

use super::SystemService;
use crate::models::{ApiResponse, AppStartTime, system::responses::HealthResponse};

fn uptime_seconds(request: &HttpRequest) -> i64 {
    request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| {
            chrono::Utc::now()
                .signed_duration_since(start.start_datetime)
                .num_seconds()
        })
        .unwrap_or_default()
}

/// Reachable without a token; 503 when the database does not answer
pub async fn health(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let database = match service.get_storage(request)?.ping().await {
        Ok(()) => true,
        Err(e) => {
            error!("Health check: database unreachable: {}", e);
            false
        }
    };

    let response = HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime_seconds(request),
        database,
    };

    let mut builder = if database {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    Ok(builder.json(ApiResponse::success(response, "Estado del servicio")))
}
