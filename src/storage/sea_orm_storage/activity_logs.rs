use super::SeaOrmStorage;
use crate::entity::activity_logs::{ActiveModel, Column, Entity as ActivityLogs};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    activity::{
        entities::ActivityLog,
        requests::{ActivityListQuery, NewActivityLog},
        responses::ActivityListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};

/// Row for `log`, shared with the transfer transaction
pub(super) fn log_active_model(log: NewActivityLog, now: i64) -> ActiveModel {
    ActiveModel {
        user_id: Set(log.user_id),
        action: Set(log.action.to_string()),
        description: Set(log.description),
        metadata: Set(log.metadata.map(|m| m.to_string())),
        ip_address: Set(log.ip_address),
        user_agent: Set(log.user_agent),
        created_at: Set(now),
        ..Default::default()
    }
}

fn apply_filters(mut select: Select<ActivityLogs>, query: &ActivityListQuery) -> Select<ActivityLogs> {
    if let Some(user_id) = query.user_id {
        select = select.filter(Column::UserId.eq(user_id));
    }
    if let Some(action) = query.action {
        select = select.filter(Column::Action.eq(action.as_str()));
    }
    if let Some(from) = query.from {
        select = select.filter(Column::CreatedAt.gte(from));
    }
    if let Some(to) = query.to {
        select = select.filter(Column::CreatedAt.lt(to));
    }
    select
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
}

impl SeaOrmStorage {
    pub async fn create_activity_log_impl(&self, log: NewActivityLog) -> Result<ActivityLog> {
        let now = chrono::Utc::now().timestamp();

        let result = log_active_model(log, now)
            .insert(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al registrar actividad: {e}"))
            })?;

        Ok(result.into_activity_log())
    }

    pub async fn list_activity_logs_with_pagination_impl(
        &self,
        query: ActivityListQuery,
    ) -> Result<ActivityListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let paginator = apply_filters(ActivityLogs::find(), &query).paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar actividad: {e}"))
        })?;
        let items = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al listar actividad: {e}"))
        })?;

        Ok(ActivityListResponse {
            items: items.into_iter().map(|m| m.into_activity_log()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn export_activity_logs_impl(
        &self,
        query: ActivityListQuery,
        limit: u64,
    ) -> Result<Vec<ActivityLog>> {
        let items = apply_filters(ActivityLogs::find(), &query)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al exportar actividad: {e}"))
            })?;

        Ok(items.into_iter().map(|m| m.into_activity_log()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, new_user};
    use crate::models::{
        activity::{
            entities::ActivityAction,
            requests::{ActivityListQuery, NewActivityLog},
        },
        users::entities::UserRole,
    };
    use crate::storage::Storage;

    fn log(user_id: Option<i64>, action: ActivityAction) -> NewActivityLog {
        NewActivityLog {
            user_id,
            action,
            description: action.to_string(),
            metadata: Some(serde_json::json!({ "k": 1 })),
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_filters_and_metadata_round_trip() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user(12345678, UserRole::Student, 0))
            .await
            .unwrap();

        storage
            .create_activity_log(log(Some(user.id), ActivityAction::Login))
            .await
            .unwrap();
        storage
            .create_activity_log(log(Some(user.id), ActivityAction::Logout))
            .await
            .unwrap();
        storage
            .create_activity_log(log(None, ActivityAction::LoginFailed))
            .await
            .unwrap();

        let mine = storage
            .list_activity_logs_with_pagination(ActivityListQuery {
                user_id: Some(user.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.pagination.total, 2);
        assert_eq!(mine.items[0].metadata, Some(serde_json::json!({ "k": 1 })));

        let failed = storage
            .list_activity_logs_with_pagination(ActivityListQuery {
                action: Some(ActivityAction::LoginFailed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.items.len(), 1);
        assert!(failed.items[0].user_id.is_none());

        let future = storage
            .list_activity_logs_with_pagination(ActivityListQuery {
                from: Some(chrono::Utc::now().timestamp() + 3600),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(future.pagination.total, 0);

        let exported = storage
            .export_activity_logs(ActivityListQuery::default(), 2)
            .await
            .unwrap();
        assert_eq!(exported.len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_user_keeps_logs() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user(12345678, UserRole::Student, 0))
            .await
            .unwrap();
        storage
            .create_activity_log(log(Some(user.id), ActivityAction::Login))
            .await
            .unwrap();
        storage.delete_user(user.id).await.unwrap();

        let all = storage
            .list_activity_logs_with_pagination(ActivityListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.items.len(), 1);
        assert!(all.items[0].user_id.is_none());
    }
}
