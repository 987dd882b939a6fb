use super::entities::{Transfer, TransferRecipient};
use crate::models::common::PaginationInfo;
use crate::models::users::entities::PublicUser;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferRecipientDetail {
    pub recipient: PublicUser,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferDetail {
    pub transfer: Transfer,
    pub sender: PublicUser,
    pub recipients: Vec<TransferRecipientDetail>,
}

/// Result of a successful transfer
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferReceipt {
    pub transfer: Transfer,
    pub recipients: Vec<TransferRecipient>,
    pub sender_balance: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferListResponse {
    pub items: Vec<TransferDetail>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferStats {
    pub total_sent: i64,
    pub total_received: i64,
    pub sent_count: i64,
    pub received_count: i64,
    pub balance: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct RecipientSearchResponse {
    pub items: Vec<PublicUser>,
    pub pagination: PaginationInfo,
}
