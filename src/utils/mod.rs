pub mod extractor;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod request_info;
pub mod rut;
pub mod sql;
pub mod validate;

pub use extractor::{SafeConfigKey, SafeIDI64};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::{contains_literal, escape_like_pattern};
