use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::{InstitutionService, institution_conflict};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode, activity::entities::ActivityAction,
    institutions::requests::CreateInstitutionRequest,
};
use crate::services::{ActivityLogger, internal_error};
use crate::services::users::validation::{FieldError, check_email, check_phone, check_rut};

const MAX_NAME_LEN: usize = 120;
const MAX_ADDRESS_LEN: usize = 255;

pub(super) fn check_institution_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("El nombre de la institución es obligatorio");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("El nombre de la institución no puede superar los 120 caracteres");
    }
    Ok(name.to_string())
}

pub(super) fn check_address(raw: &str) -> Result<String, &'static str> {
    let address = raw.trim();
    if address.chars().count() > MAX_ADDRESS_LEN {
        return Err("La dirección no puede superar los 255 caracteres");
    }
    Ok(address.to_string())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Optional RUT, email and phone; blank cells mean absent
pub(super) fn check_contact(
    rut: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(Option<String>, Option<String>, Option<String>), FieldError> {
    let rut = present(rut).map(check_rut).transpose()?;
    let email = present(email).map(check_email).transpose()?;
    let phone = check_phone(phone)?;
    Ok((rut, email, phone))
}

fn invalid(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::InstitutionInvalid,
        message.into(),
    ))
}

fn normalize(data: CreateInstitutionRequest) -> Result<CreateInstitutionRequest, HttpResponse> {
    let name = check_institution_name(&data.name).map_err(invalid)?;
    let (rut, email, phone) = check_contact(
        data.rut.as_deref(),
        data.email.as_deref(),
        data.phone.as_deref(),
    )
    .map_err(|e| invalid(e.message))?;
    let address = match data.address {
        Some(ref address) => Some(check_address(address).map_err(invalid)?),
        None => None,
    }
    .filter(|a| !a.is_empty());

    Ok(CreateInstitutionRequest {
        name,
        rut,
        address,
        phone,
        email,
    })
}

pub async fn create_institution(
    service: &InstitutionService,
    data: CreateInstitutionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let data = match normalize(data) {
        Ok(data) => data,
        Err(response) => return Ok(response),
    };

    let storage = service.get_storage(request)?;
    match storage.create_institution(data).await {
        Ok(institution) => {
            ActivityLogger::record(
                storage.as_ref(),
                request,
                RequireJWT::extract_user_id(request),
                ActivityAction::InstitutionCreated,
                format!("Institución {} creada", institution.name),
                Some(json!({ "institution_id": institution.id, "name": institution.name })),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(institution, "Institución creada")))
        }
        Err(e) if e.is_unique_violation() => Ok(institution_conflict()),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al crear la institución: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_institution_name_bounds() {
        assert_eq!(check_institution_name("  Liceo A-12 ").unwrap(), "Liceo A-12");
        assert!(check_institution_name("   ").is_err());
        assert!(check_institution_name(&"n".repeat(121)).is_err());
        assert!(check_institution_name(&"ñ".repeat(120)).is_ok());
    }

    #[test]
    fn test_normalize_contact_fields() {
        let data = normalize(CreateInstitutionRequest {
            name: "Colegio San Andrés".into(),
            rut: Some("76.543.210-3".into()),
            address: Some("  ".into()),
            phone: Some("".into()),
            email: Some("Contacto@SanAndres.CL".into()),
        })
        .unwrap();
        assert_eq!(data.rut.as_deref(), Some("76543210-3"));
        assert_eq!(data.email.as_deref(), Some("contacto@sanandres.cl"));
        assert_eq!(data.address, None);
        assert_eq!(data.phone, None);
    }

    #[test]
    fn test_normalize_rejects_bad_rut() {
        let res = normalize(CreateInstitutionRequest {
            name: "Colegio".into(),
            rut: Some("76.543.210-4".into()),
            address: None,
            phone: None,
            email: None,
        });
        assert!(res.is_err());
    }
}
