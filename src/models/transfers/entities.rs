use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub enum TransferType {
    Single,
    Multiple,
}

impl TransferType {
    pub fn for_recipient_count(count: usize) -> Self {
        if count == 1 {
            TransferType::Single
        } else {
            TransferType::Multiple
        }
    }
}

impl<'de> Deserialize<'de> for TransferType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferType::Single => write!(f, "single"),
            TransferType::Multiple => write!(f, "multiple"),
        }
    }
}

impl std::str::FromStr for TransferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(TransferType::Single),
            "multiple" => Ok(TransferType::Multiple),
            _ => Err(format!("Invalid transfer type: {s}")),
        }
    }
}

/// Transfers are only ever persisted once fully applied
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub enum TransferStatus {
    Completed,
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TransferStatus::Completed),
            _ => Err(format!("Invalid transfer status: {s}")),
        }
    }
}

/// History filter relative to the caller
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub enum TransferDirection {
    Sent,
    Received,
    #[default]
    All,
}

impl<'de> Deserialize<'de> for TransferDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "sent" => Ok(TransferDirection::Sent),
            "received" => Ok(TransferDirection::Received),
            "all" | "" => Ok(TransferDirection::All),
            _ => Err(serde::de::Error::custom(format!(
                "Dirección inválida: '{s}'. Valores permitidos: sent, received, all"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct Transfer {
    pub id: i64,
    /// UUID v4
    pub reference: String,
    pub sender_id: i64,
    pub total_amount: i64,
    pub description: Option<String>,
    pub transfer_type: TransferType,
    pub status: TransferStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/transfer.ts")]
pub struct TransferRecipient {
    pub id: i64,
    pub transfer_id: i64,
    pub recipient_id: i64,
    pub amount: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_type_from_count() {
        assert_eq!(TransferType::for_recipient_count(1), TransferType::Single);
        assert_eq!(TransferType::for_recipient_count(3), TransferType::Multiple);
    }

    #[test]
    fn test_direction_parsing() {
        let d: TransferDirection = serde_json::from_str("\"received\"").unwrap();
        assert_eq!(d, TransferDirection::Received);
        assert!(serde_json::from_str::<TransferDirection>("\"both\"").is_err());
        assert_eq!(TransferDirection::default(), TransferDirection::All);
    }
}
