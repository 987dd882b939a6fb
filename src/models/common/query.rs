//! Deserializers for flattened query strings.
//!
//! With `#[serde(flatten)]` every query value reaches the target as a string,
//! so numeric and boolean filters need to parse it themselves.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrI64 {
    Int(i64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrBool {
    Bool(bool),
    Str(String),
}

pub fn optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StrOrI64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StrOrI64::Int(v)) => Ok(Some(v)),
        Some(StrOrI64::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(StrOrI64::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{s}' no es un número válido"))),
    }
}

pub fn optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StrOrBool>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StrOrBool::Bool(v)) => Ok(Some(v)),
        Some(StrOrBool::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(serde::de::Error::custom(format!(
                "'{s}' no es un booleano válido"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "optional_i64")]
        id: Option<i64>,
        #[serde(default, deserialize_with = "optional_bool")]
        flag: Option<bool>,
    }

    #[test]
    fn test_parses_strings_and_natives() {
        let f: Filter = serde_json::from_str(r#"{"id":"12","flag":"true"}"#).unwrap();
        assert_eq!((f.id, f.flag), (Some(12), Some(true)));
        let f: Filter = serde_json::from_str(r#"{"id":7,"flag":false}"#).unwrap();
        assert_eq!((f.id, f.flag), (Some(7), Some(false)));
        let f: Filter = serde_json::from_str("{}").unwrap();
        assert_eq!((f.id, f.flag), (None, None));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Filter>(r#"{"id":"x"}"#).is_err());
        assert!(serde_json::from_str::<Filter>(r#"{"flag":"maybe"}"#).is_err());
    }
}
