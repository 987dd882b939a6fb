use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use tracing::info;

use super::UserService;
use crate::errors::BancarizateError;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityAction,
    users::{requests::AdjustBalanceRequest, responses::BalanceAdjustmentResponse},
};
use crate::services::{ActivityLogger, internal_error};

const MAX_REASON_LEN: usize = 255;

/// Non-zero amount and trimmed, bounded reason
fn check_adjustment(adjustment: &AdjustBalanceRequest) -> Result<Option<String>, &'static str> {
    if adjustment.amount == 0 {
        return Err("El monto del ajuste no puede ser cero");
    }
    let reason = adjustment
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if reason.is_some_and(|r| r.chars().count() > MAX_REASON_LEN) {
        return Err("El motivo no puede superar los 255 caracteres");
    }
    Ok(reason.map(str::to_string))
}

pub async fn adjust_balance(
    service: &UserService,
    user_id: i64,
    adjustment: AdjustBalanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let reason = match check_adjustment(&adjustment) {
        Ok(reason) => reason,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BalanceAdjustmentInvalid,
                msg,
            )));
        }
    };

    let storage = service.get_storage(request)?;
    let user = match storage.adjust_balance(user_id, adjustment.amount).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "Usuario no encontrado",
            )));
        }
        Err(BancarizateError::InsufficientFunds(_)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::InsufficientFunds,
                "El saldo resultante no puede ser negativo",
            )));
        }
        Err(BancarizateError::Validation(msg)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BalanceAdjustmentInvalid,
                msg,
            )));
        }
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::UserUpdateFailed,
                format!("Error al ajustar el saldo: {e}"),
            ));
        }
    };

    let response = BalanceAdjustmentResponse {
        user_id: user.id,
        previous_balance: user.balance - adjustment.amount,
        amount: adjustment.amount,
        new_balance: user.balance,
    };

    info!(
        "Balance of user {} adjusted by {} to {}",
        user.id, adjustment.amount, user.balance
    );
    ActivityLogger::record(
        storage.as_ref(),
        request,
        RequireJWT::extract_user_id(request),
        ActivityAction::BalanceAdjusted,
        format!("Saldo de {} ajustado en {}", user.rut, adjustment.amount),
        Some(json!({
            "user_id": user.id,
            "amount": adjustment.amount,
            "previous_balance": response.previous_balance,
            "new_balance": response.new_balance,
            "reason": reason,
        })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Saldo ajustado")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: i64, reason: Option<&str>) -> AdjustBalanceRequest {
        AdjustBalanceRequest {
            amount,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert!(check_adjustment(&request(0, None)).is_err());
    }

    #[test]
    fn test_reason_trimmed_and_bounded() {
        assert_eq!(
            check_adjustment(&request(-500, Some("  premio  "))).unwrap(),
            Some("premio".to_string())
        );
        assert_eq!(check_adjustment(&request(10, Some("   "))).unwrap(), None);
        let long = "x".repeat(256);
        assert!(check_adjustment(&request(10, Some(&long))).is_err());
    }

    #[tokio::test]
    async fn test_overflowing_credit_is_bad_request() {
        use crate::models::users::entities::UserRole;
        use crate::storage::Storage;
        use crate::storage::sea_orm_storage::test_support::{memory_storage, new_user};
        use actix_web::{http::StatusCode, test::TestRequest, web};
        use std::sync::Arc;

        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let user = storage
            .create_user(new_user(12345678, UserRole::Student, 100))
            .await
            .unwrap();
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();

        let resp = adjust_balance(
            &UserService::new_lazy(),
            user.id,
            request(i64::MAX, None),
            &req,
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let after = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(after.balance, 100);
    }
}
