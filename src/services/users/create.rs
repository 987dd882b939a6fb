use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use tracing::info;

use super::UserService;
use super::validation::{UserDraft, validate_user_draft};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityAction,
    users::requests::CreateUserRequest,
};
use crate::services::{ActivityLogger, DynamicConfig, internal_error};
use crate::utils::password::hash_password;

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let balance = match user_data.balance {
        Some(balance) => balance,
        None => DynamicConfig::initial_balance().await,
    };

    let draft = UserDraft {
        rut: &user_data.rut,
        email: &user_data.email,
        password: &user_data.password,
        role: user_data.role.clone(),
        first_name: &user_data.first_name,
        last_name: &user_data.last_name,
        phone: user_data.phone.as_deref(),
        balance,
        institution_id: user_data.institution_id,
        course_id: user_data.course_id,
    };

    let mut new_user = match validate_user_draft(&draft) {
        Ok(user) => user,
        // first failure only, the import reports all of them
        Err(errors) => match errors.first() {
            Some(first) => return Ok(first.bad_request()),
            None => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::BadRequest, "Datos inválidos")));
            }
        },
    };

    new_user.password_hash = match hash_password(&user_data.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al procesar la contraseña: {e}"),
            ));
        }
    };

    let storage = service.get_storage(request)?;

    match storage.create_user(new_user).await {
        Ok(user) => {
            info!("User {} created with role {}", user.id, user.role);
            ActivityLogger::record(
                storage.as_ref(),
                request,
                RequireJWT::extract_user_id(request),
                ActivityAction::UserCreated,
                format!("Usuario {} creado", user.rut),
                Some(json!({
                    "user_id": user.id,
                    "rut": user.rut,
                    "role": user.role,
                    "balance": user.balance,
                })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "Usuario creado")))
        }
        Err(e) if e.is_unique_violation() => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Ya existe un usuario con ese RUT o correo",
            ),
        )),
        Err(e) if e.is_foreign_key_violation() => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(
                ErrorCode::InstitutionNotFound,
                "La institución o el curso indicado no existe",
            ),
        )),
        Err(e) => Ok(internal_error(
            ErrorCode::UserCreationFailed,
            format!("Error al crear el usuario: {e}"),
        )),
    }
}
