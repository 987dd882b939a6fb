use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;
use tracing::{info, warn};

use super::TransferService;
use super::plan::plan_transfer;
use crate::errors::BancarizateError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, transfers::requests::CreateTransferRequest};
use crate::services::{DynamicConfig, internal_error, unauthorized};
use crate::utils::request_info::request_origin;

pub async fn create_transfer(
    service: &TransferService,
    data: CreateTransferRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(sender_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let recipients = match data.recipient_list() {
        Ok(recipients) => recipients,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::TransferInvalid, msg)));
        }
    };

    let storage = service.get_storage(request)?;

    // the cached user may carry a stale balance
    let sender = match storage.get_user_by_id(sender_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(unauthorized()),
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::TransferFailed,
                format!("Error al obtener el remitente: {e}"),
            ));
        }
    };

    let limits = DynamicConfig::transfer_limits().await; // read per request

    let mut found = HashMap::with_capacity(recipients.len());
    // oversized requests are rejected by plan_transfer without lookups
    if recipients.len() as i64 <= limits.max_recipients {
        for entry in &recipients {
            if found.contains_key(&entry.recipient_id) {
                continue;
            }
            match storage.get_user_by_id(entry.recipient_id).await {
                Ok(Some(user)) => {
                    found.insert(user.id, user);
                }
                Ok(None) => {}
                Err(e) => {
                    return Ok(internal_error(
                        ErrorCode::TransferFailed,
                        format!("Error al obtener el destinatario: {e}"),
                    ));
                }
            }
        }
    }

    let plan = match plan_transfer(
        &sender,
        recipients,
        data.description.as_deref(),
        &limits,
        &found,
    ) {
        Ok(plan) => plan,
        Err(rejection) => {
            warn!(
                "Transfer from user {} rejected: {}",
                sender_id, rejection.message
            );
            return Ok(rejection.into_response());
        }
    };

    let recipient_count = plan.recipients.len();
    let total = plan.total_amount;

    // debit, credits and logs commit together or not at all
    match storage.execute_transfer(plan, request_origin(request)).await {
        Ok(receipt) => {
            info!(
                "Transfer {} completed: user {} sent {} to {} recipient(s)",
                receipt.transfer.reference, sender_id, total, recipient_count
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                receipt,
                "Transferencia realizada",
            )))
        }
        Err(BancarizateError::InsufficientFunds(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InsufficientFunds, msg))),
        Err(BancarizateError::TransferRejected(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::RecipientNotFound, msg))),
        Err(BancarizateError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::TransferAmountOutOfRange, msg))),
        Err(e) => Ok(internal_error(
            ErrorCode::TransferFailed,
            format!("Error al realizar la transferencia: {e}"),
        )),
    }
}
