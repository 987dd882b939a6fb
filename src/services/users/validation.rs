//! Field checks shared by account creation, admin edits, self-service
//! profile updates and the CSV import.

use actix_web::HttpResponse;

use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserRole, requests::NewUser},
};
use crate::utils::rut::normalize_rut;
use crate::utils::validate::{
    normalize_email, normalize_phone, validate_email, validate_name, validate_password_simple,
};

/// Rejected field, rendered as a 400
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldError {
    pub field: &'static str,
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ApiResponse::error_empty(self.code, self.message.clone()))
    }
}

pub(crate) fn check_rut(raw: &str) -> Result<String, FieldError> {
    normalize_rut(raw).map_err(|msg| FieldError::new("rut", ErrorCode::UserRutInvalid, msg))
}

/// Lowercased, format-checked email
pub(crate) fn check_email(raw: &str) -> Result<String, FieldError> {
    let email = normalize_email(raw);
    validate_email(&email)
        .map(|_| email)
        .map_err(|msg| FieldError::new("email", ErrorCode::UserEmailInvalid, msg))
}

/// Blank means no phone
pub(crate) fn check_phone(raw: Option<&str>) -> Result<Option<String>, FieldError> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        Some(phone) => normalize_phone(phone)
            .map(Some)
            .map_err(|msg| FieldError::new("phone", ErrorCode::UserPhoneInvalid, msg)),
        None => Ok(None),
    }
}

pub(crate) fn check_name(field: &'static str, raw: &str) -> Result<String, FieldError> {
    validate_name(raw).map_err(|msg| FieldError::new(field, ErrorCode::UserNameInvalid, msg))
}

pub(crate) fn check_password(raw: &str) -> Result<(), FieldError> {
    validate_password_simple(raw)
        .map_err(|msg| FieldError::new("password", ErrorCode::UserPasswordInvalid, msg))
}

pub(crate) fn check_balance(balance: i64) -> Result<i64, FieldError> {
    if balance < 0 {
        return Err(FieldError::new(
            "balance",
            ErrorCode::BalanceAdjustmentInvalid,
            "El saldo inicial no puede ser negativo",
        ));
    }
    Ok(balance)
}

fn collect<T: Default>(errors: &mut Vec<FieldError>, res: Result<T, FieldError>) -> T {
    res.unwrap_or_else(|e| {
        errors.push(e);
        T::default()
    })
}

/// Raw account fields before normalization
#[derive(Debug, Clone)]
pub(crate) struct UserDraft<'a> {
    pub rut: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: UserRole,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
    pub balance: i64,
    pub institution_id: Option<i64>,
    pub course_id: Option<i64>,
}

/// Validates every field and returns the row to persist, with the plain
/// password left in `password_hash` for the caller to hash.
///
/// All failures are collected so the import can report each cell.
pub(crate) fn validate_user_draft(draft: &UserDraft<'_>) -> Result<NewUser, Vec<FieldError>> {
    let mut errors = Vec::new();

    let rut = collect(&mut errors, check_rut(draft.rut));
    let email = collect(&mut errors, check_email(draft.email));
    let first_name = collect(&mut errors, check_name("first_name", draft.first_name));
    let last_name = collect(&mut errors, check_name("last_name", draft.last_name));
    collect(&mut errors, check_password(draft.password));
    let balance = collect(&mut errors, check_balance(draft.balance));
    let phone = collect(&mut errors, check_phone(draft.phone));

    if draft.course_id.is_some() && draft.role != UserRole::Student {
        errors.push(FieldError::new(
            "course_id",
            ErrorCode::CourseInvalid,
            "Solo los estudiantes pueden tener curso",
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewUser {
        rut,
        email,
        password_hash: draft.password.to_string(),
        role: draft.role.clone(),
        first_name,
        last_name,
        phone,
        balance,
        institution_id: draft.institution_id,
        course_id: draft.course_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft<'a>() -> UserDraft<'a> {
        UserDraft {
            rut: "12.345.678-5",
            email: " Ana.Soto@Colegio.CL ",
            password: "Segura2025",
            role: UserRole::Student,
            first_name: " Ana ",
            last_name: "Soto",
            phone: Some("9 1234 5678"),
            balance: 5000,
            institution_id: Some(1),
            course_id: Some(2),
        }
    }

    #[test]
    fn test_draft_is_normalized() {
        let user = validate_user_draft(&draft()).unwrap();
        assert_eq!(user.rut, "12345678-5");
        assert_eq!(user.email, "ana.soto@colegio.cl");
        assert_eq!(user.first_name, "Ana");
        assert_eq!(user.phone.as_deref(), Some("+56912345678"));
        assert_eq!(user.balance, 5000);
    }

    #[test]
    fn test_draft_collects_every_error() {
        let mut bad = draft();
        bad.rut = "12.345.678-9";
        bad.email = "ana@";
        bad.password = "corta";
        bad.balance = -1;
        let errors = validate_user_draft(&bad).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["rut", "email", "password", "balance"]);
        assert_eq!(errors[0].code, ErrorCode::UserRutInvalid);
    }

    #[test]
    fn test_course_only_for_students() {
        let mut teacher = draft();
        teacher.role = UserRole::Teacher;
        let errors = validate_user_draft(&teacher).unwrap_err();
        assert_eq!(errors[0].field, "course_id");
    }

    #[test]
    fn test_blank_phone_is_none() {
        assert_eq!(check_phone(Some("  ")).unwrap(), None);
        assert_eq!(check_phone(None).unwrap(), None);
        assert!(check_phone(Some("123")).is_err());
    }
}
