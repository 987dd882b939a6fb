use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TransferService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    transfers::requests::{TransferListParams, TransferListQuery},
    users::entities::UserRole,
};
use crate::services::{internal_error, unauthorized};

/// Caller's history, newest first; admins may list every transfer
pub async fn list_transfers(
    service: &TransferService,
    query: TransferListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let all_users = query.all_users.unwrap_or(false);
    if all_users && RequireJWT::extract_user_role(request) != Some(UserRole::Admin) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Solo un administrador puede ver todas las transferencias",
        )));
    }

    let list_query = TransferListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        user_id: (!all_users).then_some(user_id),
        direction: query.direction.unwrap_or_default(),
    };

    let storage = service.get_storage(request)?;
    match storage.list_transfers_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Transferencias obtenidas correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al listar transferencias: {e}"),
        )),
    }
}
