//! Unified error handling.
//!
//! Error variants are generated by a macro so that every variant carries a
//! stable code and a human readable type name.

use std::fmt;

/// Generates the error enum together with:
/// - `code()` - stable error code
/// - `error_type()` - error type name
/// - `message()` - error detail
/// - snake_case constructors (`BancarizateError::not_found("...")`)
macro_rules! define_bancarizate_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum BancarizateError {
            $($variant(String),)*
        }

        impl BancarizateError {
            pub fn code(&self) -> &'static str {
                match self {
                    $(BancarizateError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(BancarizateError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(BancarizateError::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl BancarizateError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        BancarizateError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_bancarizate_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    Conflict("E010", "Resource Conflict"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
    InsufficientFunds("E014", "Insufficient Funds"),
    TransferRejected("E015", "Transfer Rejected"),
}

impl BancarizateError {
    /// Colored output for development builds
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// Whether the underlying database error is a uniqueness violation.
    ///
    /// SQLite and Postgres word it differently, both are matched.
    pub fn is_unique_violation(&self) -> bool {
        let msg = self.message();
        msg.contains("UNIQUE constraint failed")
            || msg.contains("duplicate key value")
            || msg.contains("unique constraint")
    }

    /// Whether the underlying database error is a foreign key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        let msg = self.message();
        msg.contains("FOREIGN KEY constraint failed") || msg.contains("violates foreign key")
    }
}

impl fmt::Display for BancarizateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for BancarizateError {}

impl From<sea_orm::DbErr> for BancarizateError {
    fn from(err: sea_orm::DbErr) -> Self {
        BancarizateError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for BancarizateError {
    fn from(err: std::io::Error) -> Self {
        BancarizateError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for BancarizateError {
    fn from(err: serde_json::Error) -> Self {
        BancarizateError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for BancarizateError {
    fn from(err: chrono::ParseError) -> Self {
        BancarizateError::DateParse(err.to_string())
    }
}

impl From<csv::Error> for BancarizateError {
    fn from(err: csv::Error) -> Self {
        BancarizateError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BancarizateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BancarizateError::cache_connection("test").code(), "E001");
        assert_eq!(BancarizateError::database_config("test").code(), "E003");
        assert_eq!(BancarizateError::validation("test").code(), "E007");
        assert_eq!(BancarizateError::authentication("test").code(), "E012");
        assert_eq!(BancarizateError::insufficient_funds("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            BancarizateError::insufficient_funds("x").error_type(),
            "Insufficient Funds"
        );
        assert_eq!(
            BancarizateError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_format_simple() {
        let err = BancarizateError::validation("RUT inválido");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("RUT inválido"));
    }

    #[test]
    fn test_constraint_detection() {
        let sqlite = BancarizateError::database_operation(
            "Execution Error: UNIQUE constraint failed: users.rut",
        );
        assert!(sqlite.is_unique_violation());
        assert!(!sqlite.is_foreign_key_violation());

        let pg = BancarizateError::database_operation(
            "duplicate key value violates unique constraint \"users_email_key\"",
        );
        assert!(pg.is_unique_violation());

        let fk = BancarizateError::database_operation(
            "insert or update on table \"courses\" violates foreign key constraint",
        );
        assert!(fk.is_foreign_key_violation());
    }
}
