//! CSV mass upload of accounts.
//!
//! The file is parsed and validated in full before anything is written.
//! Rows whose RUT or email is already taken, in the database or earlier in
//! the same file, are skipped. Each remaining row is created on its own, so
//! one failure does not undo the others.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

use super::UserService;
use super::validation::{UserDraft, validate_user_draft};
use crate::config::AppConfig;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::models::users::responses::{BulkUploadReport, GeneratedPassword, ImportRowError};
use crate::models::{ApiResponse, ErrorCode, activity::entities::ActivityAction};
use crate::services::{ActivityLogger, DynamicConfig, internal_error};
use crate::utils::password::{generate_password, hash_password};

const REQUIRED_COLUMNS: [&str; 5] = ["rut", "email", "first_name", "last_name", "role"];
const GENERATED_PASSWORD_LEN: usize = 12;

#[derive(Debug, PartialEq)]
enum ImportParseError {
    MissingColumn(&'static str),
    TooManyRows(usize),
    ParseFailed(String),
    Empty,
}

impl ImportParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn(_) => ErrorCode::ImportFileMissingColumn,
            Self::TooManyRows(_) => ErrorCode::ImportFileTooManyRows,
            Self::ParseFailed(_) | Self::Empty => ErrorCode::ImportFileParseFailed,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingColumn(col) => format!("Falta la columna obligatoria: {col}"),
            Self::TooManyRows(max) => format!("El archivo supera el máximo de {max} filas"),
            Self::ParseFailed(msg) => msg.clone(),
            Self::Empty => "El archivo no contiene filas".to_string(),
        }
    }
}

/// Raw cells of one data row, trimmed; blank optional cells are `None`
#[derive(Debug, Clone, Default, PartialEq)]
struct ImportRow {
    row: usize,
    rut: String,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    password: Option<String>,
    phone: Option<String>,
    balance: Option<String>,
    institution_id: Option<String>,
    course_id: Option<String>,
}

/// Validated row waiting to be hashed and stored
#[derive(Debug)]
struct ImportCandidate {
    row: usize,
    user: NewUser,
    generated_password: bool,
}

fn row_error(row: usize, field: &str, message: impl Into<String>) -> ImportRowError {
    ImportRowError {
        row,
        field: field.to_string(),
        message: message.into(),
    }
}

fn parse_csv(data: &[u8], max_rows: usize) -> Result<Vec<ImportRow>, ImportParseError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = rdr
        .headers()
        .map_err(|e| ImportParseError::ParseFailed(format!("No se pudo leer el encabezado: {e}")))?;
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    for col in REQUIRED_COLUMNS {
        if !columns.contains_key(col) {
            return Err(ImportParseError::MissingColumn(col));
        }
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| {
            ImportParseError::ParseFailed(format!("Fila {} ilegible: {e}", rows.len() + 1))
        })?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if rows.len() == max_rows {
            return Err(ImportParseError::TooManyRows(max_rows));
        }

        let cell = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|i| record.get(*i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        let optional = |name: &str| Some(cell(name)).filter(|v| !v.is_empty());

        rows.push(ImportRow {
            row: rows.len() + 1,
            rut: cell("rut"),
            email: cell("email"),
            first_name: cell("first_name"),
            last_name: cell("last_name"),
            role: cell("role"),
            password: optional("password"),
            phone: optional("phone"),
            balance: optional("balance"),
            institution_id: optional("institution_id"),
            course_id: optional("course_id"),
        });
    }

    if rows.is_empty() {
        return Err(ImportParseError::Empty);
    }
    Ok(rows)
}

fn parse_number(
    row: usize,
    field: &str,
    raw: Option<&str>,
    errors: &mut Vec<ImportRowError>,
) -> Option<i64> {
    let raw = raw?;
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(row_error(row, field, format!("Valor numérico inválido: {raw}")));
            None
        }
    }
}

/// Validates every row; rows with at least one error count as failed
fn validate_rows(
    rows: &[ImportRow],
    default_balance: i64,
    report: &mut BulkUploadReport,
) -> Vec<ImportCandidate> {
    let mut candidates = Vec::new();

    for row in rows {
        let mut errors = Vec::new();

        let role = match row.role.parse::<UserRole>() {
            Ok(role) => Some(role),
            Err(_) => {
                errors.push(row_error(
                    row.row,
                    "role",
                    format!("Rol inválido: '{}'. Use admin, teacher o student", row.role),
                ));
                None
            }
        };
        let balance = parse_number(row.row, "balance", row.balance.as_deref(), &mut errors);
        let institution_id =
            parse_number(row.row, "institution_id", row.institution_id.as_deref(), &mut errors);
        let course_id = parse_number(row.row, "course_id", row.course_id.as_deref(), &mut errors);

        let (password, generated_password) = match row.password {
            Some(ref password) => (password.clone(), false),
            None => (generate_password(GENERATED_PASSWORD_LEN), true),
        };

        let draft = UserDraft {
            rut: &row.rut,
            email: &row.email,
            password: &password,
            role: role.clone().unwrap_or(UserRole::Student),
            first_name: &row.first_name,
            last_name: &row.last_name,
            phone: row.phone.as_deref(),
            balance: balance.unwrap_or(default_balance),
            institution_id,
            course_id,
        };

        match validate_user_draft(&draft) {
            Ok(user) if errors.is_empty() => candidates.push(ImportCandidate {
                row: row.row,
                user,
                generated_password,
            }),
            Ok(_) => {}
            Err(field_errors) => errors.extend(
                field_errors
                    .into_iter()
                    .map(|e| row_error(row.row, e.field, e.message)),
            ),
        }

        if !errors.is_empty() {
            report.failed += 1;
            report.errors.extend(errors);
        }
    }

    candidates
}

/// Drops rows colliding with stored accounts or with an earlier row
fn drop_duplicates(
    candidates: Vec<ImportCandidate>,
    existing_ruts: &HashSet<String>,
    existing_emails: &HashSet<String>,
    report: &mut BulkUploadReport,
) -> Vec<ImportCandidate> {
    let mut seen_ruts = HashSet::new();
    let mut seen_emails = HashSet::new();
    let mut unique = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let rut = &candidate.user.rut;
        let email = &candidate.user.email;

        let conflict = if existing_ruts.contains(rut) {
            Some(("rut", format!("El RUT {rut} ya está registrado")))
        } else if existing_emails.contains(email) {
            Some(("email", format!("El correo {email} ya está registrado")))
        } else if seen_ruts.contains(rut) {
            Some(("rut", format!("El RUT {rut} está repetido en el archivo")))
        } else if seen_emails.contains(email) {
            Some(("email", format!("El correo {email} está repetido en el archivo")))
        } else {
            None
        };

        if let Some((field, message)) = conflict {
            report.skipped += 1;
            report.errors.push(row_error(candidate.row, field, message));
            continue;
        }

        seen_ruts.insert(rut.clone());
        seen_emails.insert(email.clone());
        unique.push(candidate);
    }

    unique
}

/// Reads the `file` field, rejecting it once it exceeds `max_size` bytes
async fn read_upload(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<Vec<u8>, (ErrorCode, String)> {
    let mut data = Vec::new();
    let mut found = false;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .is_some_and(|name| name == "file");
        if !is_file {
            continue;
        }
        found = true;

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                (
                    ErrorCode::ImportFileParseFailed,
                    format!("Error al leer el archivo: {e}"),
                )
            })?;
            if data.len() + chunk.len() > max_size {
                return Err((
                    ErrorCode::ImportFileTooLarge,
                    format!("El archivo supera el máximo de {max_size} bytes"),
                ));
            }
            data.extend_from_slice(&chunk);
        }
    }

    if !found || data.is_empty() {
        return Err((
            ErrorCode::ImportFileMissing,
            "Debe adjuntar un archivo CSV en el campo 'file'".to_string(),
        ));
    }
    Ok(data)
}

pub async fn import_users(
    service: &UserService,
    mut payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let limits = &AppConfig::get().upload;

    let data = match read_upload(&mut payload, limits.max_size).await {
        Ok(data) => data,
        Err((code, msg)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
        }
    };

    let rows = match parse_csv(&data, limits.max_rows) {
        Ok(rows) => rows,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(e.error_code(), e.message())));
        }
    };

    let mut report = BulkUploadReport {
        total: rows.len(),
        ..Default::default()
    };

    let default_balance = DynamicConfig::initial_balance().await;
    let candidates = validate_rows(&rows, default_balance, &mut report);

    let storage = service.get_storage(request)?;

    let ruts: Vec<String> = candidates.iter().map(|c| c.user.rut.clone()).collect();
    let emails: Vec<String> = candidates.iter().map(|c| c.user.email.clone()).collect();
    let existing = match (
        storage.existing_ruts(&ruts).await,
        storage.existing_emails(&emails).await,
    ) {
        (Ok(ruts), Ok(emails)) => (
            ruts.into_iter().collect::<HashSet<_>>(),
            emails.into_iter().collect::<HashSet<_>>(),
        ),
        (Err(e), _) | (_, Err(e)) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al verificar duplicados: {e}"),
            ));
        }
    };

    let candidates = drop_duplicates(candidates, &existing.0, &existing.1, &mut report);

    for candidate in candidates {
        let ImportCandidate {
            row,
            mut user,
            generated_password,
        } = candidate;

        let plain = user.password_hash.clone();
        let hashed = match tokio::task::spawn_blocking(move || hash_password(&plain)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(e)) => {
                report.failed += 1;
                report
                    .errors
                    .push(row_error(row, "password", format!("Error al procesar la contraseña: {e}")));
                continue;
            }
            Err(e) => {
                report.failed += 1;
                report
                    .errors
                    .push(row_error(row, "password", format!("Error al procesar la contraseña: {e}")));
                continue;
            }
        };
        let password = std::mem::replace(&mut user.password_hash, hashed);

        match storage.create_user(user).await {
            Ok(created) => {
                report.success += 1;
                if generated_password {
                    report.generated_passwords.push(GeneratedPassword {
                        row,
                        rut: created.rut,
                        password,
                    });
                }
            }
            Err(e) if e.is_unique_violation() => {
                report.skipped += 1;
                report
                    .errors
                    .push(row_error(row, "rut", "El RUT o correo ya está registrado"));
            }
            Err(e) if e.is_foreign_key_violation() => {
                report.failed += 1;
                report.errors.push(row_error(
                    row,
                    "institution_id",
                    "La institución o el curso indicado no existe",
                ));
            }
            Err(e) => {
                error!("Bulk upload row {} failed: {}", row, e);
                report.failed += 1;
                report
                    .errors
                    .push(row_error(row, "", format!("Error al crear el usuario: {e}")));
            }
        }
    }

    info!(
        "Bulk upload finished: {} total, {} created, {} skipped, {} failed",
        report.total, report.success, report.skipped, report.failed
    );
    ActivityLogger::record(
        storage.as_ref(),
        request,
        RequireJWT::extract_user_id(request),
        ActivityAction::BulkUpload,
        format!("Carga masiva: {} usuarios creados", report.success),
        Some(json!({
            "total": report.total,
            "success": report.success,
            "skipped": report.skipped,
            "failed": report.failed,
        })),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Carga masiva completada")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{feff}RUT,Email,First_Name,Last_Name,Role,Password,Balance\n\
        12.345.678-5,ana@colegio.cl,Ana,Soto,student,Segura2025,1500\n\
        \n\
        7.654.321-6,pedro@colegio.cl,Pedro,Rojas,teacher,,\n";

    #[test]
    fn test_parse_csv_headers_and_rows() {
        let rows = parse_csv(CSV.as_bytes(), 1000).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].rut, "12.345.678-5");
        assert_eq!(rows[0].balance.as_deref(), Some("1500"));
        assert_eq!(rows[1].row, 2);
        assert_eq!(rows[1].password, None);
        assert_eq!(rows[1].phone, None);
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let err = parse_csv(b"rut,email,first_name,role\n1-9,a@b.cl,A,student\n", 10).unwrap_err();
        assert_eq!(err, ImportParseError::MissingColumn("last_name"));
        assert_eq!(err.error_code(), ErrorCode::ImportFileMissingColumn);
    }

    #[test]
    fn test_parse_csv_limits() {
        assert_eq!(
            parse_csv(CSV.as_bytes(), 1).unwrap_err(),
            ImportParseError::TooManyRows(1)
        );
        assert_eq!(
            parse_csv(b"rut,email,first_name,last_name,role\n", 10).unwrap_err(),
            ImportParseError::Empty
        );
    }

    #[test]
    fn test_validate_rows_generates_passwords() {
        let rows = parse_csv(CSV.as_bytes(), 1000).unwrap();
        let mut report = BulkUploadReport::default();
        let candidates = validate_rows(&rows, 300, &mut report);

        assert_eq!(report.failed, 0);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].user.rut, "12345678-5");
        assert_eq!(candidates[0].user.balance, 1500);
        assert!(!candidates[0].generated_password);
        assert_eq!(candidates[1].user.role, UserRole::Teacher);
        assert_eq!(candidates[1].user.balance, 300);
        assert!(candidates[1].generated_password);
        assert_eq!(candidates[1].user.password_hash.len(), GENERATED_PASSWORD_LEN);
    }

    #[test]
    fn test_validate_rows_reports_each_cell() {
        let rows = vec![ImportRow {
            row: 4,
            rut: "12.345.678-9".into(),
            email: "ana@colegio.cl".into(),
            first_name: "Ana".into(),
            last_name: "Soto".into(),
            role: "guest".into(),
            password: Some("Segura2025".into()),
            balance: Some("mil".into()),
            ..Default::default()
        }];
        let mut report = BulkUploadReport::default();
        let candidates = validate_rows(&rows, 0, &mut report);

        assert!(candidates.is_empty());
        assert_eq!(report.failed, 1);
        let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["role", "balance", "rut"]);
        assert!(report.errors.iter().all(|e| e.row == 4));
    }

    #[test]
    fn test_drop_duplicates() {
        let csv = "rut,email,first_name,last_name,role,password\n\
            12.345.678-5,ana@colegio.cl,Ana,Soto,student,Segura2025\n\
            12345678-5,otra@colegio.cl,Ana,Soto,student,Segura2025\n\
            7.654.321-6,ANA@colegio.cl,Pedro,Rojas,student,Segura2025\n\
            11.111.111-1,admin@colegio.cl,Admin,Uno,admin,Segura2025\n";
        let rows = parse_csv(csv.as_bytes(), 1000).unwrap();
        let mut report = BulkUploadReport::default();
        let candidates = validate_rows(&rows, 0, &mut report);
        assert_eq!(candidates.len(), 4);

        let existing_ruts = HashSet::from(["11111111-1".to_string()]);
        let unique = drop_duplicates(candidates, &existing_ruts, &HashSet::new(), &mut report);

        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].row, 1);
        assert_eq!(report.skipped, 3);
        let skipped_rows: Vec<_> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(skipped_rows, vec![2, 3, 4]);
    }
}
