use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::create::{check_address, check_contact, check_institution_name};
use super::{InstitutionService, institution_conflict, institution_not_found};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode, activity::entities::ActivityAction,
    institutions::requests::UpdateInstitutionRequest,
};
use crate::services::{ActivityLogger, internal_error};

fn normalize(data: UpdateInstitutionRequest) -> Result<UpdateInstitutionRequest, String> {
    let name = data
        .name
        .as_deref()
        .map(check_institution_name)
        .transpose()?;
    let address = data.address.as_deref().map(check_address).transpose()?;
    let (rut, email, phone) = check_contact(
        data.rut.as_deref(),
        data.email.as_deref(),
        data.phone.as_deref(),
    )
    .map_err(|e| e.message)?;

    Ok(UpdateInstitutionRequest {
        name,
        rut,
        address,
        phone,
        email,
        is_active: data.is_active,
    })
}

pub async fn update_institution(
    service: &InstitutionService,
    institution_id: i64,
    data: UpdateInstitutionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let data = match normalize(data) {
        Ok(data) => data,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::InstitutionInvalid, msg)));
        }
    };
    let deactivated = data.is_active == Some(false);

    let storage = service.get_storage(request)?;
    match storage.update_institution(institution_id, data).await {
        Ok(Some(institution)) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                RequireJWT::extract_user_id(request),
                ActivityAction::InstitutionUpdated,
                format!("Institución {} actualizada", institution.name),
                Some(json!({
                    "institution_id": institution.id,
                    "deactivated": deactivated,
                })),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                institution,
                "Institución actualizada",
            )))
        }
        Ok(None) => Ok(institution_not_found()),
        Err(e) if e.is_unique_violation() => Ok(institution_conflict()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al actualizar la institución: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keeps_absent_fields() {
        let data = normalize(UpdateInstitutionRequest {
            name: Some(" Liceo Nuevo ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(data.name.as_deref(), Some("Liceo Nuevo"));
        assert!(data.rut.is_none());
        assert!(data.email.is_none());
        assert!(data.is_active.is_none());
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let res = normalize(UpdateInstitutionRequest {
            name: Some("  ".into()),
            ..Default::default()
        });
        assert!(res.is_err());
    }
}
