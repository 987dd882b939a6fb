use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::ActivityService;
use super::list::build_query;
use crate::models::{ApiResponse, ErrorCode, activity::entities::ActivityLog};
use crate::models::activity::requests::ActivityListParams;
use crate::services::internal_error;

const EXPORT_LIMIT: u64 = 10_000;

pub async fn export_activity(
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
    let logs = match storage.export_activity_logs(query, EXPORT_LIMIT).await {
        Ok(logs) => logs,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InternalServerError,
                format!("Error al exportar la actividad: {e}"),
            ));
        }
    };

    let data = activity_csv(&logs).map_err(|e| {
        error!("Activity CSV generation failed: {}", e);
        actix_web::error::ErrorInternalServerError(format!("Error al generar CSV: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"actividad.csv\"",
        ))
        .body(data))
}

fn activity_csv(logs: &[ActivityLog]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "created_at",
        "user_id",
        "action",
        "description",
        "ip_address",
        "user_agent",
        "metadata",
    ])?;

    for log in logs {
        wtr.write_record([
            log.id.to_string(),
            log.created_at.to_rfc3339(),
            log.user_id.map(|id| id.to_string()).unwrap_or_default(),
            log.action.clone(),
            log.description.clone(),
            log.ip_address.clone().unwrap_or_default(),
            log.user_agent.clone().unwrap_or_default(),
            log.metadata
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_default(),
        ])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_csv_quotes_fields() {
        let log = ActivityLog {
            id: 3,
            user_id: None,
            action: "transfer_sent".into(),
            description: "Envío a Ana, Pedro".into(),
            metadata: Some(serde_json::json!({"amount": 500})),
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
            created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        };

        let data = String::from_utf8(activity_csv(&[log]).unwrap()).unwrap();
        let mut lines = data.lines();
        assert_eq!(
            lines.next(),
            Some("id,created_at,user_id,action,description,ip_address,user_agent,metadata")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("3,1970-01-01T00:00:00+00:00,,transfer_sent,\"Envío a Ana, Pedro\""));
        assert!(row.ends_with("\"{\"\"amount\"\":500}\""));
    }
}
