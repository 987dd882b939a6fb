use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub enum SettingValueType {
    String,
    Integer,
    Boolean,
}

impl SettingValueType {
    /// Checks that `value` is well-formed for this type.
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            SettingValueType::String => Ok(()),
            SettingValueType::Integer => value
                .trim()
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("'{value}' no es un número entero")),
            SettingValueType::Boolean => match value.trim() {
                "true" | "false" => Ok(()),
                _ => Err(format!("'{value}' no es un booleano (true/false)")),
            },
        }
    }
}

impl<'de> Deserialize<'de> for SettingValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for SettingValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValueType::String => write!(f, "string"),
            SettingValueType::Integer => write!(f, "integer"),
            SettingValueType::Boolean => write!(f, "boolean"),
        }
    }
}

impl std::str::FromStr for SettingValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(SettingValueType::String),
            "integer" => Ok(SettingValueType::Integer),
            "boolean" => Ok(SettingValueType::Boolean),
            _ => Err(format!("Invalid setting value type: {s}")),
        }
    }
}

/// Keys with a typed accessor in `DynamicConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSettingKey {
    SystemName,
    TransferMinAmount,
    TransferMaxAmount,
    TransferMaxRecipients,
    InitialBalance,
    AccessTokenExpiry,
}

impl KnownSettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownSettingKey::SystemName => "app.system_name",
            KnownSettingKey::TransferMinAmount => "transfer.min_amount",
            KnownSettingKey::TransferMaxAmount => "transfer.max_amount",
            KnownSettingKey::TransferMaxRecipients => "transfer.max_recipients",
            KnownSettingKey::InitialBalance => "users.initial_balance",
            KnownSettingKey::AccessTokenExpiry => "jwt.access_token_expiry",
        }
    }

    pub fn value_type(&self) -> SettingValueType {
        match self {
            KnownSettingKey::SystemName => SettingValueType::String,
            _ => SettingValueType::Integer,
        }
    }

    /// Range rules on top of the type check
    pub fn check_value(&self, value: &str) -> Result<(), String> {
        self.value_type().check(value)?;
        let value = value.trim();
        match self {
            KnownSettingKey::SystemName => {
                let len = value.chars().count();
                if !(1..=60).contains(&len) {
                    return Err("El nombre del sistema debe tener entre 1 y 60 caracteres".into());
                }
            }
            KnownSettingKey::TransferMinAmount | KnownSettingKey::TransferMaxAmount => {
                let n: i64 = value.parse().unwrap_or_default();
                if n < 1 {
                    return Err("El monto debe ser mayor o igual a 1".into());
                }
            }
            KnownSettingKey::TransferMaxRecipients => {
                let n: i64 = value.parse().unwrap_or_default();
                if !(1..=100).contains(&n) {
                    return Err("El máximo de destinatarios debe estar entre 1 y 100".into());
                }
            }
            KnownSettingKey::InitialBalance => {
                let n: i64 = value.parse().unwrap_or(-1);
                if n < 0 {
                    return Err("El saldo inicial no puede ser negativo".into());
                }
            }
            KnownSettingKey::AccessTokenExpiry => {
                let n: i64 = value.parse().unwrap_or_default();
                if !(1..=1440).contains(&n) {
                    return Err("La vigencia debe estar entre 1 y 1440 minutos".into());
                }
            }
        }
        Ok(())
    }

    pub fn all() -> Vec<Self> {
        vec![
            KnownSettingKey::SystemName,
            KnownSettingKey::TransferMinAmount,
            KnownSettingKey::TransferMaxAmount,
            KnownSettingKey::TransferMaxRecipients,
            KnownSettingKey::InitialBalance,
            KnownSettingKey::AccessTokenExpiry,
        ]
    }
}

impl std::str::FromStr for KnownSettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownSettingKey::all()
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown setting key: {s}"))
    }
}

/// Row of `system_config`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_check() {
        assert!(SettingValueType::Integer.check("42").is_ok());
        assert!(SettingValueType::Integer.check("4.2").is_err());
        assert!(SettingValueType::Boolean.check("true").is_ok());
        assert!(SettingValueType::Boolean.check("yes").is_err());
        assert!(SettingValueType::String.check("").is_ok());
    }

    #[test]
    fn test_known_key_ranges() {
        assert!(KnownSettingKey::TransferMaxRecipients.check_value("20").is_ok());
        assert!(KnownSettingKey::TransferMaxRecipients.check_value("0").is_err());
        assert!(KnownSettingKey::TransferMinAmount.check_value("0").is_err());
        assert!(KnownSettingKey::InitialBalance.check_value("0").is_ok());
        assert!(KnownSettingKey::InitialBalance.check_value("-5").is_err());
        assert!(KnownSettingKey::AccessTokenExpiry.check_value("abc").is_err());
        assert!(KnownSettingKey::SystemName.check_value("").is_err());
    }

    #[test]
    fn test_key_lookup() {
        assert_eq!(
            "transfer.max_amount".parse::<KnownSettingKey>().unwrap(),
            KnownSettingKey::TransferMaxAmount
        );
        assert!("upload.allowed_types".parse::<KnownSettingKey>().is_err());
    }
}
