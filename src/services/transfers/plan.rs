//! Transfer rules, checked in order before anything is written.
//!
//! Balances here come from a fresh read; the storage debit is conditional on
//! the balance again, so a concurrent spend still cannot overdraw.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use std::collections::{HashMap, HashSet};

use crate::models::transfers::entities::TransferType;
use crate::models::transfers::requests::{TransferPlan, TransferRecipientInput};
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::system::settings_cache::TransferLimits;

pub const MAX_DESCRIPTION_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRejection {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

impl TransferRejection {
    fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::build(self.status).json(ApiResponse::error_empty(self.code, self.message))
    }
}

/// Shape checks that need no database access
pub fn check_request(
    sender_id: i64,
    recipients: &[TransferRecipientInput],
    description: Option<&str>,
    limits: &TransferLimits,
) -> Result<(i64, Option<String>), TransferRejection> {
    if recipients.is_empty() {
        return Err(TransferRejection::bad_request(
            ErrorCode::TransferInvalid,
            "Debe indicar al menos un destinatario",
        ));
    }
    if recipients.len() as i64 > limits.max_recipients {
        return Err(TransferRejection::bad_request(
            ErrorCode::TooManyRecipients,
            format!(
                "Máximo {} destinatarios por transferencia",
                limits.max_recipients
            ),
        ));
    }

    if let Some(entry) = recipients
        .iter()
        .find(|r| r.amount < limits.min_amount || r.amount > limits.max_amount)
    {
        return Err(TransferRejection::bad_request(
            ErrorCode::TransferAmountOutOfRange,
            format!(
                "El monto {} está fuera del rango permitido ({} a {})",
                entry.amount, limits.min_amount, limits.max_amount
            ),
        ));
    }

    if recipients.iter().any(|r| r.recipient_id == sender_id) {
        return Err(TransferRejection::bad_request(
            ErrorCode::SelfTransferNotAllowed,
            "No puede transferirse a sí mismo",
        ));
    }

    let mut seen = HashSet::with_capacity(recipients.len());
    if !recipients.iter().all(|r| seen.insert(r.recipient_id)) {
        return Err(TransferRejection::bad_request(
            ErrorCode::TransferInvalid,
            "Cada destinatario puede aparecer una sola vez",
        ));
    }

    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    if description
        .as_deref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
    {
        return Err(TransferRejection::bad_request(
            ErrorCode::TransferInvalid,
            "La descripción no puede superar los 255 caracteres",
        ));
    }

    let total = recipients
        .iter()
        .try_fold(0i64, |acc, r| acc.checked_add(r.amount))
        .ok_or_else(|| {
            TransferRejection::bad_request(ErrorCode::TransferInvalid, "El monto total es demasiado grande")
        })?;

    Ok((total, description))
}

/// Full rule set; `found` holds the recipients that exist, keyed by id
pub fn plan_transfer(
    sender: &User,
    recipients: Vec<TransferRecipientInput>,
    description: Option<&str>,
    limits: &TransferLimits,
    found: &HashMap<i64, User>,
) -> Result<TransferPlan, TransferRejection> {
    let (total_amount, description) = check_request(sender.id, &recipients, description, limits)?;

    if !sender.is_active() {
        return Err(TransferRejection {
            status: StatusCode::FORBIDDEN,
            code: ErrorCode::AccountInactive,
            message: "Su cuenta no está activa".to_string(),
        });
    }

    for entry in &recipients {
        match found.get(&entry.recipient_id) {
            None => {
                return Err(TransferRejection {
                    status: StatusCode::NOT_FOUND,
                    code: ErrorCode::RecipientNotFound,
                    message: format!("El destinatario {} no existe", entry.recipient_id),
                });
            }
            Some(user) if !user.is_active() => {
                return Err(TransferRejection::bad_request(
                    ErrorCode::RecipientInactive,
                    format!("La cuenta de {} no está activa", user.full_name()),
                ));
            }
            Some(_) => {}
        }
    }

    if sender.balance < total_amount {
        return Err(TransferRejection::bad_request(
            ErrorCode::InsufficientFunds,
            "Saldo insuficiente para realizar la transferencia",
        ));
    }

    Ok(TransferPlan {
        sender_id: sender.id,
        transfer_type: TransferType::for_recipient_count(recipients.len()),
        recipients,
        total_amount,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserRole, UserStatus};

    fn user(id: i64, balance: i64, status: UserStatus) -> User {
        let epoch = chrono::DateTime::from_timestamp(0, 0).unwrap();
        User {
            id,
            rut: format!("{id}-0"),
            email: format!("u{id}@test.cl"),
            password_hash: String::new(),
            role: UserRole::Student,
            status,
            first_name: "Usuario".into(),
            last_name: id.to_string(),
            phone: None,
            avatar_url: None,
            balance,
            email_notifications: true,
            transfer_notifications: true,
            last_login: None,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    fn to(recipient_id: i64, amount: i64) -> TransferRecipientInput {
        TransferRecipientInput {
            recipient_id,
            amount,
        }
    }

    fn found(users: &[User]) -> HashMap<i64, User> {
        users.iter().map(|u| (u.id, u.clone())).collect()
    }

    fn limits() -> TransferLimits {
        TransferLimits {
            min_amount: 10,
            max_amount: 5_000,
            max_recipients: 3,
        }
    }

    #[test]
    fn test_plan_multiple() {
        let sender = user(1, 10_000, UserStatus::Active);
        let others = found(&[user(2, 0, UserStatus::Active), user(3, 0, UserStatus::Active)]);
        let plan = plan_transfer(
            &sender,
            vec![to(2, 1_000), to(3, 2_500)],
            Some("  colación  "),
            &limits(),
            &others,
        )
        .unwrap();
        assert_eq!(plan.total_amount, 3_500);
        assert_eq!(plan.transfer_type, TransferType::Multiple);
        assert_eq!(plan.description.as_deref(), Some("colación"));
    }

    #[test]
    fn test_limits() {
        let code = |recipients: Vec<TransferRecipientInput>| {
            check_request(1, &recipients, None, &limits())
                .unwrap_err()
                .code
        };
        assert_eq!(code(vec![]), ErrorCode::TransferInvalid);
        assert_eq!(
            code(vec![to(2, 10), to(3, 10), to(4, 10), to(5, 10)]),
            ErrorCode::TooManyRecipients
        );
        assert_eq!(code(vec![to(2, 9)]), ErrorCode::TransferAmountOutOfRange);
        assert_eq!(code(vec![to(2, 5_001)]), ErrorCode::TransferAmountOutOfRange);
        assert!(check_request(1, &[to(2, 10), to(3, 5_000)], None, &limits()).is_ok());
    }

    #[test]
    fn test_self_and_duplicates() {
        let err = check_request(1, &[to(1, 100)], None, &limits()).unwrap_err();
        assert_eq!(err.code, ErrorCode::SelfTransferNotAllowed);
        let err = check_request(1, &[to(2, 100), to(2, 200)], None, &limits()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransferInvalid);
    }

    #[test]
    fn test_description_length() {
        let long = "a".repeat(MAX_DESCRIPTION_LEN + 1);
        let err = check_request(1, &[to(2, 100)], Some(&long), &limits()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransferInvalid);
        let (_, description) = check_request(1, &[to(2, 100)], Some("   "), &limits()).unwrap();
        assert_eq!(description, None);
    }

    #[test]
    fn test_total_overflow() {
        let wide = TransferLimits {
            min_amount: 1,
            max_amount: i64::MAX,
            max_recipients: 5,
        };
        let err = check_request(1, &[to(2, i64::MAX), to(3, 1)], None, &wide).unwrap_err();
        assert_eq!(err.code, ErrorCode::TransferInvalid);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parties() {
        let sender = user(1, 10_000, UserStatus::Active);

        let err = plan_transfer(&sender, vec![to(9, 100)], None, &limits(), &HashMap::new())
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, ErrorCode::RecipientNotFound);

        let suspended = found(&[user(2, 0, UserStatus::Suspended)]);
        let err = plan_transfer(&sender, vec![to(2, 100)], None, &limits(), &suspended).unwrap_err();
        assert_eq!(err.code, ErrorCode::RecipientInactive);

        let inactive_sender = user(1, 10_000, UserStatus::Inactive);
        let active = found(&[user(2, 0, UserStatus::Active)]);
        let err =
            plan_transfer(&inactive_sender, vec![to(2, 100)], None, &limits(), &active).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_insufficient_funds() {
        let sender = user(1, 150, UserStatus::Active);
        let others = found(&[user(2, 0, UserStatus::Active), user(3, 0, UserStatus::Active)]);
        let err = plan_transfer(&sender, vec![to(2, 100), to(3, 100)], None, &limits(), &others)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientFunds);

        let exact = plan_transfer(&sender, vec![to(2, 100), to(3, 50)], None, &limits(), &others)
            .unwrap();
        assert_eq!(exact.total_amount, 150);
        assert_eq!(exact.recipients.len(), 2);
    }
}
