use serde::Deserialize;
use ts_rs::TS;

/// New value for a `system_config` key; numbers and booleans are accepted as-is
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct UpdateConfigRequest {
    pub value: serde_json::Value,
}

impl UpdateConfigRequest {
    /// Stored representation of the value
    pub fn value_string(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_string() {
        let req: UpdateConfigRequest = serde_json::from_str(r#"{"value":25}"#).unwrap();
        assert_eq!(req.value_string().as_deref(), Some("25"));
        let req: UpdateConfigRequest = serde_json::from_str(r#"{"value":"Banco"}"#).unwrap();
        assert_eq!(req.value_string().as_deref(), Some("Banco"));
        let req: UpdateConfigRequest = serde_json::from_str(r#"{"value":[1]}"#).unwrap();
        assert!(req.value_string().is_none());
    }
}
