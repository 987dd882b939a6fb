use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

// after stripping separators and the +56 prefix
static CL_MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^9\d{8}$").expect("Invalid mobile regex"));
static CL_LANDLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[2-8]\d{7,8}$").expect("Invalid landline regex"));

pub const NAME_MAX_CHARS: usize = 60;

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("El formato del correo electrónico no es válido");
    }
    Ok(())
}

/// Lowercased, trimmed email
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Chilean phone number normalized to `+56XXXXXXXXX`.
///
/// Spaces, hyphens and parentheses are ignored; the `+56` / `56` prefix is
/// optional.
pub fn normalize_phone(phone: &str) -> Result<String, &'static str> {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let local = digits
        .strip_prefix("+56")
        .or_else(|| digits.strip_prefix("56").filter(|rest| rest.len() >= 9))
        .unwrap_or(&digits);

    if CL_MOBILE_RE.is_match(local) || CL_LANDLINE_RE.is_match(local) {
        Ok(format!("+56{local}"))
    } else {
        Err("El teléfono debe ser un número chileno válido (ej: +56 9 1234 5678)")
    }
}

/// First or last name, returned trimmed
pub fn validate_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        return Err("El nombre no puede estar vacío");
    }
    if len > NAME_MAX_CHARS {
        return Err("El nombre no puede superar los 60 caracteres");
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err("El nombre contiene caracteres no permitidos");
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// Password policy: at least 8 characters with upper, lower and digit, and
/// not one of the well-known weak passwords.
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("La contraseña debe tener al menos 8 caracteres");
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("La contraseña debe contener al menos una mayúscula");
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("La contraseña debe contener al menos una minúscula");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("La contraseña debe contener al menos un número");
    }

    let weak_passwords = [
        "password",
        "password1",
        "12345678",
        "123456789",
        "qwerty123",
        "admin123",
        "abcd1234",
        "contraseña1",
        "bancarizate1",
        "chile123",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("La contraseña es demasiado común");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("Alcancia2024").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"La contraseña debe tener al menos 8 caracteres")
        );
    }

    #[test]
    fn test_missing_classes() {
        assert!(
            validate_password("abcd1234x")
                .errors
                .contains(&"La contraseña debe contener al menos una mayúscula")
        );
        assert!(
            validate_password("ABCD1234X")
                .errors
                .contains(&"La contraseña debe contener al menos una minúscula")
        );
        assert!(
            validate_password("AbcdEfgh")
                .errors
                .contains(&"La contraseña debe contener al menos un número")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(result.errors.contains(&"La contraseña es demasiado común"));
        assert!(validate_password_simple("Bancarizate1").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ana.soto@colegio.cl").is_ok());
        assert!(validate_email("a+b@x.com").is_ok());
        assert!(validate_email("sin-arroba.cl").is_err());
        assert!(validate_email("a@b").is_err());
        assert_eq!(normalize_email("  Ana@Colegio.CL "), "ana@colegio.cl");
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone("+56 9 1234 5678").unwrap(), "+56912345678");
        assert_eq!(normalize_phone("912345678").unwrap(), "+56912345678");
        assert_eq!(normalize_phone("56-9-1234-5678").unwrap(), "+56912345678");
        assert_eq!(normalize_phone("(2) 2345 6789").unwrap(), "+56223456789");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("+1 555 123 4567").is_err());
        assert!(normalize_phone("9123456789").is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(validate_name("  María José ").unwrap(), "María José");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(61)).is_err());
        assert!(validate_name(&"ñ".repeat(60)).is_ok());
    }
}
