use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{NaiveDate, TimeDelta};

use super::ActivityService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::requests::{ActivityListParams, ActivityListQuery},
};
use crate::services::{internal_error, unauthorized};

/// `YYYY-MM-DD` bounds to `[from, to)` unix seconds, `to` covering the whole day
pub(crate) fn parse_date_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<i64>, Option<i64>), String> {
    let parse = |raw: &str| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| format!("Fecha inválida '{raw}', use el formato AAAA-MM-DD"))
    };
    let start_of = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());

    let from = match from.filter(|s| !s.trim().is_empty()) {
        Some(raw) => start_of(parse(raw)?),
        None => None,
    };
    let to = match to.filter(|s| !s.trim().is_empty()) {
        Some(raw) => {
            let date = parse(raw)?;
            date.checked_add_signed(TimeDelta::days(1)).and_then(start_of)
        }
        None => None,
    };

    if let (Some(from), Some(to)) = (from, to)
        && from >= to
    {
        return Err("La fecha 'from' debe ser anterior o igual a 'to'".to_string());
    }

    Ok((from, to))
}

/// Filters shared by the admin list and the export
pub(crate) fn build_query(params: &ActivityListParams) -> Result<ActivityListQuery, String> {
    let (from, to) = parse_date_range(params.from.as_deref(), params.to.as_deref())?;
    Ok(ActivityListQuery {
        page: Some(params.pagination.page),
        size: Some(params.pagination.size),
        user_id: params.user_id,
        action: params.action,
        from,
        to,
    })
}

pub async fn list_own_activity(
    service: &ActivityService,
    params: ActivityListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let mut query = match build_query(&params) {
        Ok(query) => query,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
    };
    // other users' rows are never visible here
    query.user_id = Some(user_id);

    let storage = service.get_storage(request)?;
    match storage.list_activity_logs_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Actividad obtenida correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener la actividad: {e}"),
        )),
    }
}

pub async fn list_all_activity(
    service: &ActivityService,
    params: ActivityListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let query = match build_query(&params) {
        Ok(query) => query,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
        }
    };

    let storage = service.get_storage(request)?;
    match storage.list_activity_logs_with_pagination(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Actividad obtenida correctamente",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Error al obtener la actividad: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_covers_whole_days() {
        let (from, to) = parse_date_range(Some("2025-03-01"), Some("2025-03-01")).unwrap();
        assert_eq!(from, Some(1_740_787_200));
        assert_eq!(to, Some(1_740_787_200 + 86_400));

        assert_eq!(parse_date_range(None, Some("")).unwrap(), (None, None));
    }

    #[test]
    fn test_date_range_rejects_bad_input() {
        assert!(parse_date_range(Some("01-03-2025"), None).is_err());
        assert!(parse_date_range(Some("2025-02-30"), None).is_err());
        assert!(parse_date_range(Some("2025-03-05"), Some("2025-03-01")).is_err());
    }
}
