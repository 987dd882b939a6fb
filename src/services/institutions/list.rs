use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::InstitutionService;
use crate::models::{
    ApiResponse, ErrorCode,
    institutions::requests::{InstitutionListParams, InstitutionListQuery},
};
use crate::services::internal_error;

pub async fn list_institutions(
    service: &InstitutionService,
    query: InstitutionListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let list_query = InstitutionListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        search: query.search,
        is_active: query.is_active,
    };

    match storage.list_institutions_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Instituciones obtenidas correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al listar instituciones: {e}"),
        )),
    }
}
