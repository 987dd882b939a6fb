use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TransferService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode, transfers::responses::TransferDetail, users::entities::UserRole,
};
use crate::services::{internal_error, unauthorized};

/// Sender, any recipient and administrators
fn can_view(detail: &TransferDetail, user_id: i64, role: Option<&UserRole>) -> bool {
    role == Some(&UserRole::Admin)
        || detail.sender.id == user_id
        || detail.recipients.iter().any(|r| r.recipient.id == user_id)
}

pub async fn get_transfer(
    service: &TransferService,
    transfer_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let storage = service.get_storage(request)?;
    let detail = match storage.get_transfer_detail(transfer_id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::TransferNotFound,
                "Transferencia no encontrada",
            )));
        }
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener la transferencia: {e}"),
            ));
        }
    };

    let role = RequireJWT::extract_user_role(request);
    if !can_view(&detail, user_id, role.as_ref()) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "No tiene acceso a esta transferencia",
        )));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        detail,
        "Transferencia obtenida correctamente",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transfers::entities::{Transfer, TransferStatus, TransferType};
    use crate::models::transfers::responses::TransferRecipientDetail;
    use crate::models::users::entities::PublicUser;

    fn public(id: i64) -> PublicUser {
        PublicUser {
            id,
            rut: format!("{id}-0"),
            first_name: "U".into(),
            last_name: id.to_string(),
        }
    }

    fn detail() -> TransferDetail {
        TransferDetail {
            transfer: Transfer {
                id: 1,
                reference: "ref".into(),
                sender_id: 1,
                total_amount: 300,
                description: None,
                transfer_type: TransferType::Multiple,
                status: TransferStatus::Completed,
                created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
            },
            sender: public(1),
            recipients: vec![
                TransferRecipientDetail {
                    recipient: public(2),
                    amount: 100,
                },
                TransferRecipientDetail {
                    recipient: public(3),
                    amount: 200,
                },
            ],
        }
    }

    #[test]
    fn test_transfer_visibility() {
        let detail = detail();
        assert!(can_view(&detail, 1, Some(&UserRole::Student)));
        assert!(can_view(&detail, 3, Some(&UserRole::Student)));
        assert!(!can_view(&detail, 4, Some(&UserRole::Teacher)));
        assert!(can_view(&detail, 4, Some(&UserRole::Admin)));
    }
}
