//! Path extractors that reject malformed ids with a JSON 400 instead of
//! actix's plain-text error.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ApiResponse, ErrorCode};

fn bad_path(message: String) -> actix_web::Error {
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

/// Parses a strictly positive i64 from a path segment
pub fn parse_positive_id(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("Identificador inválido: '{raw}'")),
    }
}

/// Declares a newtype extractor for a positive i64 path parameter.
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                let raw = req.match_info().get($param).unwrap_or_default();
                ready(parse_positive_id(raw).map($name).map_err(bad_path))
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");

static CONFIG_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*\.[a-z][a-z0-9_]*$").expect("Invalid key regex"));

/// `section.name` key of `system_config`
#[derive(Debug, Clone)]
pub struct SafeConfigKey(pub String);

impl FromRequest for SafeConfigKey {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("key").unwrap_or_default();
        if raw.len() <= 64 && CONFIG_KEY_RE.is_match(raw) {
            ready(Ok(SafeConfigKey(raw.to_string())))
        } else {
            ready(Err(bad_path(format!("Clave de configuración inválida: '{raw}'"))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_parse_positive_id() {
        assert_eq!(parse_positive_id("15"), Ok(15));
        assert!(parse_positive_id("0").is_err());
        assert!(parse_positive_id("-3").is_err());
        assert!(parse_positive_id("1e3").is_err());
        assert!(parse_positive_id("99999999999999999999").is_err());
    }

    #[actix_web::test]
    async fn test_id_extractor() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "42")
            .to_http_parts();
        let id = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id.0, 42);

        let (req, mut payload) = TestRequest::default()
            .param("id", "abc")
            .to_http_parts();
        assert!(SafeIDI64::from_request(&req, &mut payload).await.is_err());
    }

    #[actix_web::test]
    async fn test_config_key_extractor() {
        let (req, mut payload) = TestRequest::default()
            .param("key", "transfer.max_amount")
            .to_http_parts();
        let key = SafeConfigKey::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(key.0, "transfer.max_amount");

        let (req, mut payload) = TestRequest::default()
            .param("key", "../etc")
            .to_http_parts();
        assert!(SafeConfigKey::from_request(&req, &mut payload).await.is_err());
    }
}
