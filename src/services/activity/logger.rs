use actix_web::HttpRequest;
use tracing::warn;

use crate::models::activity::{entities::ActivityAction, requests::NewActivityLog};
use crate::storage::Storage;
use crate::utils::request_info::request_origin;

/// Writes `activity_logs` rows for request handlers.
///
/// A failed insert is logged and swallowed, it never fails the request.
/// Transfer rows are written inside the transfer transaction instead.
pub struct ActivityLogger;

impl ActivityLogger {
    pub async fn record(
        storage: &dyn Storage,
        request: &HttpRequest,
        user_id: Option<i64>,
        action: ActivityAction,
        description: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) {
        let origin = request_origin(request);
        let log = NewActivityLog {
            user_id,
            action,
            description: description.into(),
            metadata,
            ip_address: origin.ip_address,
            user_agent: origin.user_agent,
        };

        if let Err(e) = storage.create_activity_log(log).await {
            warn!("Failed to record activity '{}': {}", action, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::requests::ActivityListQuery;
    use crate::storage::sea_orm_storage::test_support::memory_storage;
    use actix_web::test::TestRequest;

    #[tokio::test]
    async fn test_record_copies_request_origin() {
        let storage = memory_storage().await;
        let request = TestRequest::default()
            .peer_addr("192.0.2.10:40000".parse().unwrap())
            .insert_header(("User-Agent", "pruebas/1.0"))
            .to_http_request();

        ActivityLogger::record(
            &storage,
            &request,
            None,
            ActivityAction::LoginFailed,
            "Intento fallido",
            Some(serde_json::json!({"identifier": "x"})),
        )
        .await;

        let logs = storage
            .list_activity_logs_with_pagination(ActivityListQuery::default())
            .await
            .unwrap();
        assert_eq!(logs.items.len(), 1);
        let log = &logs.items[0];
        assert_eq!(log.action, "login_failed");
        assert_eq!(log.ip_address.as_deref(), Some("192.0.2.10"));
        assert_eq!(log.user_agent.as_deref(), Some("pruebas/1.0"));
    }
}
