use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::UserService;
use crate::models::{ErrorCode, users::entities::User};
use crate::services::internal_error;

pub async fn export_users(service: &UserService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let users = match storage.list_all_users().await {
        Ok(users) => users,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al exportar usuarios: {e}"),
            ));
        }
    };

    let data = users_csv(&users).map_err(|e| {
        error!("User CSV generation failed: {}", e);
        actix_web::error::ErrorInternalServerError(format!("Error al generar CSV: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", "attachment; filename=\"usuarios.csv\""))
        .body(data))
}

/// Same column names the bulk upload accepts, plus read-only fields
fn users_csv(users: &[User]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "rut",
        "email",
        "first_name",
        "last_name",
        "role",
        "status",
        "phone",
        "balance",
        "last_login",
        "created_at",
    ])?;

    for user in users {
        wtr.write_record([
            user.id.to_string(),
            user.rut.clone(),
            user.email.clone(),
            user.first_name.clone(),
            user.last_name.clone(),
            user.role.to_string(),
            user.status.to_string(),
            user.phone.clone().unwrap_or_default(),
            user.balance.to_string(),
            user.last_login.map(|t| t.to_rfc3339()).unwrap_or_default(),
            user.created_at.to_rfc3339(),
        ])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserRole, UserStatus};

    #[test]
    fn test_users_csv_has_no_password() {
        let epoch = chrono::DateTime::from_timestamp(0, 0).unwrap();
        let user = User {
            id: 7,
            rut: "12345678-5".into(),
            email: "ana@colegio.cl".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Student,
            status: UserStatus::Active,
            first_name: "Ana".into(),
            last_name: "Soto".into(),
            phone: None,
            avatar_url: None,
            balance: 2500,
            email_notifications: true,
            transfer_notifications: true,
            last_login: None,
            created_at: epoch,
            updated_at: epoch,
        };

        let data = String::from_utf8(users_csv(&[user]).unwrap()).unwrap();
        assert!(!data.contains("argon2"));
        let row = data.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "7,12345678-5,ana@colegio.cl,Ana,Soto,student,active,,2500,,1970-01-01T00:00:00+00:00"
        );
    }
}
