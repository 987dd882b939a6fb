use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TransferService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, transfers::requests::RecipientSearchParams};
use crate::services::{internal_error, unauthorized};

pub async fn get_stats(service: &TransferService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let storage = service.get_storage(request)?;
    match storage.get_transfer_stats(user_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Estadísticas obtenidas correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener estadísticas: {e}"),
        )),
    }
}

/// Active users other than the caller, public fields only
pub async fn search_recipients(
    service: &TransferService,
    query: RecipientSearchParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let storage = service.get_storage(request)?;
    match storage
        .search_recipients(
            user_id,
            query.search,
            query.pagination.page,
            query.pagination.size,
        )
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Destinatarios obtenidos correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al buscar destinatarios: {e}"),
        )),
    }
}
