use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::settings_cache::TransferLimits;
use super::{DynamicConfig, SystemService};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityAction,
    system::{
        entities::{KnownSettingKey, SettingValueType},
        requests::UpdateConfigRequest,
        responses::{ConfigListResponse, PublicSettingsResponse},
    },
};
use crate::services::{ActivityLogger, internal_error, unauthorized};

/// Settings any signed-in user may read
pub async fn get_public_settings(
    service: &SystemService,
    _request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let limits = DynamicConfig::transfer_limits().await;

    let response = PublicSettingsResponse {
        system_name: DynamicConfig::system_name().await,
        transfer_min_amount: limits.min_amount,
        transfer_max_amount: limits.max_amount,
        transfer_max_recipients: limits.max_recipients,
        environment: service.get_config().app.environment.clone(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Configuración obtenida correctamente",
    )))
}

pub async fn list_config(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_all_settings().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ConfigListResponse { items },
            "Configuración obtenida correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al listar la configuración: {e}"),
        )),
    }
}

/// Normalized value to store, or why it is rejected.
///
/// Known keys get their range rules, and the transfer bounds must keep
/// `min_amount <= max_amount`.
fn check_config_value(
    key: &str,
    value_type: SettingValueType,
    value: &str,
    limits: &TransferLimits,
) -> Result<String, String> {
    value_type.check(value)?;
    let value = match value_type {
        SettingValueType::String => value.to_string(),
        _ => value.trim().to_string(),
    };

    let Ok(known) = key.parse::<KnownSettingKey>() else {
        return Ok(value);
    };
    known.check_value(&value)?;

    match known {
        KnownSettingKey::TransferMinAmount => {
            let min: i64 = value.parse().map_err(|_| "Monto inválido".to_string())?;
            if min > limits.max_amount {
                return Err(format!(
                    "El monto mínimo no puede superar al máximo ({})",
                    limits.max_amount
                ));
            }
        }
        KnownSettingKey::TransferMaxAmount => {
            let max: i64 = value.parse().map_err(|_| "Monto inválido".to_string())?;
            if max < limits.min_amount {
                return Err(format!(
                    "El monto máximo no puede ser menor al mínimo ({})",
                    limits.min_amount
                ));
            }
        }
        _ => {}
    }

    Ok(value)
}

pub async fn update_config(
    service: &SystemService,
    key: String,
    data: UpdateConfigRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let Some(raw_value) = data.value_string() else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ConfigValueInvalid,
            "El valor debe ser texto, número o booleano",
        )));
    };

    let storage = service.get_storage(request)?;
    let current = match storage.get_setting_by_key(&key).await {
        Ok(Some(setting)) => setting,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ConfigNotFound,
                format!("La clave '{key}' no existe"),
            )));
        }
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al obtener la configuración: {e}"),
            ));
        }
    };

    let limits = DynamicConfig::transfer_limits().await;
    let value = match check_config_value(&key, current.value_type, &raw_value, &limits) {
        Ok(value) => value,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ConfigValueInvalid, msg)));
        }
    };

    match storage.update_setting(&key, &value, user_id).await {
        Ok(setting) => {
            DynamicConfig::update(&key, &setting.value).await;
            ActivityLogger::record(
                storage.as_ref(),
                request,
                Some(user_id),
                ActivityAction::ConfigUpdated,
                format!("Configuración {key} actualizada"),
                Some(json!({
                    "key": key,
                    "previous_value": current.value,
                    "new_value": setting.value,
                })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(setting, "Configuración actualizada")))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al actualizar la configuración: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> TransferLimits {
        TransferLimits {
            min_amount: 100,
            max_amount: 50_000,
            max_recipients: 20,
        }
    }

    #[test]
    fn test_integer_values_are_trimmed() {
        assert_eq!(
            check_config_value("transfer.max_recipients", SettingValueType::Integer, " 10 ", &limits())
                .unwrap(),
            "10"
        );
        assert!(
            check_config_value("transfer.max_recipients", SettingValueType::Integer, "diez", &limits())
                .is_err()
        );
    }

    #[test]
    fn test_transfer_bounds_stay_ordered() {
        assert!(
            check_config_value("transfer.min_amount", SettingValueType::Integer, "60000", &limits())
                .is_err()
        );
        assert!(
            check_config_value("transfer.max_amount", SettingValueType::Integer, "99", &limits())
                .is_err()
        );
        assert!(
            check_config_value("transfer.max_amount", SettingValueType::Integer, "100", &limits())
                .is_ok()
        );
    }

    #[test]
    fn test_unknown_keys_only_type_checked() {
        assert_eq!(
            check_config_value("custom.note", SettingValueType::String, " hola ", &limits()).unwrap(),
            " hola "
        );
        assert!(
            check_config_value("custom.flag", SettingValueType::Boolean, "si", &limits()).is_err()
        );
    }
}
