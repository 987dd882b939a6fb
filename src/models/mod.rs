//! Business models, request/response DTOs and the API envelope.
//!
//! Every public response type is exported to TypeScript with `ts-rs`.

pub mod activity;
pub mod auth;
pub mod common;
pub mod courses;
pub mod institutions;
pub mod students;
pub mod system;
pub mod teachers;
pub mod transfers;
pub mod users;

use serde::Serialize;
use ts_rs::TS;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

/// Process start time, shared through `app_data`
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// Numeric error codes carried in the `code` field of every response.
///
/// 0 success, 1xxx generic, 2xxx auth, 3xxx users, 4xxx institutions and
/// courses, 5xxx transfers, 6xxx import, 7xxx system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/error_code.ts")]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    AuthFailed = 2000,
    InvalidCredentials = 2001,
    AccountInactive = 2002,
    TokenInvalid = 2003,
    RefreshTokenMissing = 2004,
    PasswordMismatch = 2005,

    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserRutInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPhoneInvalid = 3004,
    UserNameInvalid = 3005,
    UserPasswordInvalid = 3006,
    UserCreationFailed = 3007,
    UserUpdateFailed = 3008,
    UserDeleteFailed = 3009,
    CanNotDeleteCurrentUser = 3010,
    BalanceAdjustmentInvalid = 3011,

    InstitutionNotFound = 4000,
    InstitutionAlreadyExists = 4001,
    InstitutionInvalid = 4002,
    CourseNotFound = 4100,
    CourseAlreadyExists = 4101,
    CourseInvalid = 4102,
    StudentNotFound = 4200,
    TeacherNotFound = 4300,

    TransferInvalid = 5000,
    TransferNotFound = 5001,
    InsufficientFunds = 5002,
    RecipientNotFound = 5003,
    RecipientInactive = 5004,
    SelfTransferNotAllowed = 5005,
    TransferAmountOutOfRange = 5006,
    TooManyRecipients = 5007,
    TransferFailed = 5008,

    ImportFileMissing = 6000,
    ImportFileTooLarge = 6001,
    ImportFileParseFailed = 6002,
    ImportFileMissingColumn = 6003,
    ImportFileTooManyRows = 6004,

    ConfigNotFound = 7000,
    ConfigValueInvalid = 7001,
    DatabaseUnavailable = 7002,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_ranges() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::Unauthorized as i32 / 1000, 1);
        assert_eq!(ErrorCode::InvalidCredentials as i32 / 1000, 2);
        assert_eq!(ErrorCode::UserRutInvalid as i32 / 1000, 3);
        assert_eq!(ErrorCode::CourseNotFound as i32 / 1000, 4);
        assert_eq!(ErrorCode::InsufficientFunds as i32 / 1000, 5);
        assert_eq!(ErrorCode::ImportFileParseFailed as i32 / 1000, 6);
        assert_eq!(ErrorCode::ConfigValueInvalid as i32 / 1000, 7);
    }
}
