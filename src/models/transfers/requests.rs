use super::entities::{TransferDirection, TransferType};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferRecipientInput {
    pub recipient_id: i64,
    pub amount: i64,
}

/// Accepts `{recipients: [...]}` or the single form `{recipient_id, amount}`
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct CreateTransferRequest {
    pub recipients: Option<Vec<TransferRecipientInput>>,
    pub recipient_id: Option<i64>,
    pub amount: Option<i64>,
    pub description: Option<String>,
}

impl CreateTransferRequest {
    /// Collapses both request shapes into a recipient list.
    pub fn recipient_list(&self) -> Result<Vec<TransferRecipientInput>, String> {
        match (&self.recipients, self.recipient_id, self.amount) {
            (Some(_), Some(_), _) => {
                Err("Use 'recipients' o 'recipient_id', no ambos".to_string())
            }
            (Some(list), None, _) => Ok(list.clone()),
            (None, Some(recipient_id), Some(amount)) => {
                Ok(vec![TransferRecipientInput {
                    recipient_id,
                    amount,
                }])
            }
            (None, Some(_), None) => Err("Falta el monto de la transferencia".to_string()),
            (None, None, _) => Err("Debe indicar al menos un destinatario".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub direction: Option<TransferDirection>,
    /// Admin only
    #[serde(default, deserialize_with = "crate::models::common::query::optional_bool")]
    pub all_users: Option<bool>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct RecipientSearchParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

/// Storage-level history filter; `user_id = None` lists every transfer
#[derive(Debug, Clone, Default)]
pub struct TransferListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub user_id: Option<i64>,
    pub direction: TransferDirection,
}

/// Fully validated transfer, ready to apply in one database transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub sender_id: i64,
    pub recipients: Vec<TransferRecipientInput>,
    pub total_amount: i64,
    pub description: Option<String>,
    pub transfer_type: TransferType,
}

/// Request origin, copied into the activity rows written with a transfer
#[derive(Debug, Clone, Default)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_form_normalized() {
        let req: CreateTransferRequest =
            serde_json::from_str(r#"{"recipient_id":5,"amount":1500}"#).unwrap();
        assert_eq!(
            req.recipient_list().unwrap(),
            vec![TransferRecipientInput {
                recipient_id: 5,
                amount: 1500
            }]
        );
    }

    #[test]
    fn test_multi_form() {
        let req: CreateTransferRequest = serde_json::from_str(
            r#"{"recipients":[{"recipient_id":2,"amount":10},{"recipient_id":3,"amount":20}],
                "description":"almuerzo"}"#,
        )
        .unwrap();
        assert_eq!(req.recipient_list().unwrap().len(), 2);
    }

    #[test]
    fn test_ambiguous_or_incomplete_forms() {
        let both: CreateTransferRequest = serde_json::from_str(
            r#"{"recipients":[{"recipient_id":2,"amount":10}],"recipient_id":3,"amount":5}"#,
        )
        .unwrap();
        assert!(both.recipient_list().is_err());

        let no_amount: CreateTransferRequest =
            serde_json::from_str(r#"{"recipient_id":3}"#).unwrap();
        assert!(no_amount.recipient_list().is_err());

        let empty: CreateTransferRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.recipient_list().is_err());
    }
}
