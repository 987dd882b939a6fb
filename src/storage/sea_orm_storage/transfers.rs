use std::collections::HashMap;

use super::SeaOrmStorage;
use super::activity_logs::log_active_model;
use crate::entity::transfer_recipients::{
    ActiveModel as RecipientActiveModel, Column as RecipientColumn, Entity as TransferRecipients,
};
use crate::entity::transfers::{ActiveModel, Column, Entity as Transfers, Model as TransferModel};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    activity::{entities::ActivityAction, requests::NewActivityLog},
    transfers::{
        entities::{TransferDirection, TransferStatus},
        requests::{RequestOrigin, TransferListQuery, TransferPlan},
        responses::{
            TransferDetail, TransferListResponse, TransferReceipt, TransferRecipientDetail,
            TransferStats,
        },
    },
    users::entities::PublicUser,
};
use sea_orm::sea_query::{Expr, ExprTrait, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

fn db_err(context: &'static str) -> impl Fn(sea_orm::DbErr) -> BancarizateError {
    move |e| BancarizateError::database_operation(format!("{context}: {e}"))
}

/// `CAST(COALESCE(SUM(expr), 0) AS BIGINT)` as a single i64
pub(super) async fn sum_i64<E, C>(db: &C, select: Select<E>, column_sql: &str) -> Result<i64>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let total = select
        .select_only()
        .column_as(
            Expr::cust(format!("CAST(COALESCE(SUM({column_sql}), 0) AS BIGINT)")),
            "total",
        )
        .into_tuple::<i64>()
        .one(db)
        .await
        .map_err(db_err("Error al sumar montos"))?;
    Ok(total.unwrap_or(0))
}

impl SeaOrmStorage {
    pub async fn execute_transfer_impl(
        &self,
        plan: TransferPlan,
        origin: RequestOrigin,
    ) -> Result<TransferReceipt> {
        let now = chrono::Utc::now().timestamp();
        let reference = uuid::Uuid::new_v4().to_string();

        // Dropping `txn` without commit rolls everything back
        let txn = self
            .db
            .begin()
            .await
            .map_err(db_err("No se pudo iniciar la transferencia"))?;

        let debit = Users::update_many()
            .col_expr(
                UserColumn::Balance,
                Expr::col(UserColumn::Balance).sub(plan.total_amount),
            )
            .col_expr(UserColumn::UpdatedAt, Expr::value(now))
            .filter(UserColumn::Id.eq(plan.sender_id))
            .filter(UserColumn::Balance.gte(plan.total_amount))
            .exec(&txn)
            .await
            .map_err(db_err("Error al debitar al remitente"))?;

        if debit.rows_affected == 0 {
            return Err(BancarizateError::insufficient_funds(
                "Saldo insuficiente para realizar la transferencia",
            ));
        }

        for recipient in &plan.recipients {
            let credit = Users::update_many()
                .col_expr(
                    UserColumn::Balance,
                    Expr::col(UserColumn::Balance).add(recipient.amount),
                )
                .col_expr(UserColumn::UpdatedAt, Expr::value(now))
                .filter(UserColumn::Id.eq(recipient.recipient_id))
                .filter(UserColumn::Balance.lte(i64::MAX - recipient.amount))
                .exec(&txn)
                .await
                .map_err(db_err("Error al abonar al destinatario"))?;

            if credit.rows_affected == 0 {
                let exists = Users::find_by_id(recipient.recipient_id)
                    .one(&txn)
                    .await
                    .map_err(db_err("Error al abonar al destinatario"))?
                    .is_some();
                return Err(if exists {
                    BancarizateError::validation(format!(
                        "El abono excede el saldo máximo del destinatario {}",
                        recipient.recipient_id
                    ))
                } else {
                    BancarizateError::transfer_rejected(format!(
                        "El destinatario {} no existe",
                        recipient.recipient_id
                    ))
                });
            }
        }

        let transfer = ActiveModel {
            reference: Set(reference.clone()),
            sender_id: Set(plan.sender_id),
            total_amount: Set(plan.total_amount),
            description: Set(plan.description.clone()),
            transfer_type: Set(plan.transfer_type.to_string()),
            status: Set(TransferStatus::Completed.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err("Error al registrar la transferencia"))?;

        let mut recipient_rows = Vec::with_capacity(plan.recipients.len());
        for recipient in &plan.recipients {
            let row = RecipientActiveModel {
                transfer_id: Set(transfer.id),
                recipient_id: Set(recipient.recipient_id),
                amount: Set(recipient.amount),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err("Error al registrar destinatario"))?;
            recipient_rows.push(row);
        }

        let recipient_ids: Vec<i64> = plan.recipients.iter().map(|r| r.recipient_id).collect();
        let sent_log = NewActivityLog {
            user_id: Some(plan.sender_id),
            action: ActivityAction::TransferSent,
            description: format!(
                "Transferencia enviada por ${} a {} destinatario(s)",
                plan.total_amount,
                plan.recipients.len()
            ),
            metadata: Some(serde_json::json!({
                "reference": reference,
                "transfer_id": transfer.id,
                "amount": plan.total_amount,
                "recipients": recipient_ids,
            })),
            ip_address: origin.ip_address.clone(),
            user_agent: origin.user_agent.clone(),
        };
        log_active_model(sent_log, now)
            .insert(&txn)
            .await
            .map_err(db_err("Error al registrar actividad"))?;

        for recipient in &plan.recipients {
            let received_log = NewActivityLog {
                user_id: Some(recipient.recipient_id),
                action: ActivityAction::TransferReceived,
                description: format!("Transferencia recibida por ${}", recipient.amount),
                metadata: Some(serde_json::json!({
                    "reference": reference,
                    "transfer_id": transfer.id,
                    "amount": recipient.amount,
                    "sender_id": plan.sender_id,
                })),
                ip_address: origin.ip_address.clone(),
                user_agent: origin.user_agent.clone(),
            };
            log_active_model(received_log, now)
                .insert(&txn)
                .await
                .map_err(db_err("Error al registrar actividad"))?;
        }

        let sender_balance: Option<i64> = Users::find_by_id(plan.sender_id)
            .select_only()
            .column(UserColumn::Balance)
            .into_tuple()
            .one(&txn)
            .await
            .map_err(db_err("Error al leer saldo"))?;

        txn.commit()
            .await
            .map_err(db_err("No se pudo confirmar la transferencia"))?;

        Ok(TransferReceipt {
            transfer: transfer.into_transfer(),
            recipients: recipient_rows
                .into_iter()
                .map(|r| r.into_transfer_recipient())
                .collect(),
            sender_balance: sender_balance.unwrap_or_default(),
        })
    }

    pub async fn get_transfer_detail_impl(&self, id: i64) -> Result<Option<TransferDetail>> {
        let Some(transfer) = Transfers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err("Error al buscar transferencia"))?
        else {
            return Ok(None);
        };

        Ok(self.hydrate_transfers(vec![transfer]).await?.pop())
    }

    pub async fn list_transfers_with_pagination_impl(
        &self,
        query: TransferListQuery,
    ) -> Result<TransferListResponse> {
        let page = std::cmp::max(query.page.unwrap_or(1), 1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Transfers::find();

        if let Some(user_id) = query.user_id {
            let received = Column::Id.in_subquery(
                Query::select()
                    .column(RecipientColumn::TransferId)
                    .from(TransferRecipients)
                    .and_where(RecipientColumn::RecipientId.eq(user_id))
                    .to_owned(),
            );
            let sent = Column::SenderId.eq(user_id);

            select = match query.direction {
                TransferDirection::Sent => select.filter(sent),
                TransferDirection::Received => select.filter(received),
                TransferDirection::All => select.filter(Condition::any().add(sent).add(received)),
            };
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(db_err("Error al contar transferencias"))?;
        let transfers = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_err("Error al listar transferencias"))?;

        Ok(TransferListResponse {
            items: self.hydrate_transfers(transfers).await?,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn get_transfer_stats_impl(&self, user_id: i64) -> Result<TransferStats> {
        let sent = Transfers::find().filter(Column::SenderId.eq(user_id));
        let received = TransferRecipients::find().filter(RecipientColumn::RecipientId.eq(user_id));

        let total_sent = sum_i64(&self.db, sent.clone(), "total_amount").await?;
        let sent_count = sent
            .count(&self.db)
            .await
            .map_err(db_err("Error al contar transferencias"))?;
        let total_received = sum_i64(&self.db, received.clone(), "amount").await?;
        let received_count = received
            .count(&self.db)
            .await
            .map_err(db_err("Error al contar transferencias"))?;

        let balance: Option<i64> = Users::find_by_id(user_id)
            .select_only()
            .column(UserColumn::Balance)
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(db_err("Error al leer saldo"))?;

        Ok(TransferStats {
            total_sent,
            total_received,
            sent_count: sent_count as i64,
            received_count: received_count as i64,
            balance: balance.unwrap_or_default(),
        })
    }

    /// Attaches sender and recipients, keeping the order of `transfers`
    async fn hydrate_transfers(&self, transfers: Vec<TransferModel>) -> Result<Vec<TransferDetail>> {
        if transfers.is_empty() {
            return Ok(Vec::new());
        }

        let transfer_ids: Vec<i64> = transfers.iter().map(|t| t.id).collect();
        let sender_ids: Vec<i64> = transfers.iter().map(|t| t.sender_id).collect();

        let senders: HashMap<i64, PublicUser> = Users::find()
            .filter(UserColumn::Id.is_in(sender_ids))
            .all(&self.db)
            .await
            .map_err(db_err("Error al buscar remitentes"))?
            .into_iter()
            .map(|u| (u.id, u.into_public_user()))
            .collect();

        let mut recipients: HashMap<i64, Vec<TransferRecipientDetail>> = HashMap::new();
        let rows = TransferRecipients::find()
            .filter(RecipientColumn::TransferId.is_in(transfer_ids))
            .order_by_asc(RecipientColumn::Id)
            .find_also_related(Users)
            .all(&self.db)
            .await
            .map_err(db_err("Error al buscar destinatarios"))?;
        for (row, user) in rows {
            if let Some(user) = user {
                recipients
                    .entry(row.transfer_id)
                    .or_default()
                    .push(TransferRecipientDetail {
                        recipient: user.into_public_user(),
                        amount: row.amount,
                    });
            }
        }

        Ok(transfers
            .into_iter()
            .filter_map(|t| {
                let sender = senders.get(&t.sender_id)?.clone();
                let recipients = recipients.remove(&t.id).unwrap_or_default();
                Some(TransferDetail {
                    transfer: t.into_transfer(),
                    sender,
                    recipients,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, new_user};
    use crate::models::{
        activity::{entities::ActivityAction, requests::ActivityListQuery},
        transfers::{
            entities::{TransferDirection, TransferType},
            requests::{RequestOrigin, TransferListQuery, TransferPlan, TransferRecipientInput},
        },
        users::entities::UserRole,
    };
    use crate::storage::Storage;

    fn plan(sender_id: i64, recipients: &[(i64, i64)]) -> TransferPlan {
        let recipients: Vec<TransferRecipientInput> = recipients
            .iter()
            .map(|&(recipient_id, amount)| TransferRecipientInput {
                recipient_id,
                amount,
            })
            .collect();
        TransferPlan {
            sender_id,
            total_amount: recipients.iter().map(|r| r.amount).sum(),
            transfer_type: TransferType::for_recipient_count(recipients.len()),
            recipients,
            description: Some("colación".into()),
        }
    }

    async fn balance(storage: &dyn Storage, id: i64) -> i64 {
        storage.get_user_by_id(id).await.unwrap().unwrap().balance
    }

    #[tokio::test]
    async fn test_single_transfer_moves_balance() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Student, 1000))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 0))
            .await
            .unwrap();

        let receipt = storage
            .execute_transfer(plan(a.id, &[(b.id, 300)]), RequestOrigin::default())
            .await
            .unwrap();

        assert_eq!(receipt.sender_balance, 700);
        assert_eq!(receipt.transfer.total_amount, 300);
        assert_eq!(receipt.transfer.transfer_type, TransferType::Single);
        assert_eq!(receipt.transfer.reference.len(), 36);
        assert_eq!(receipt.recipients.len(), 1);
        assert_eq!(balance(&storage, a.id).await, 700);
        assert_eq!(balance(&storage, b.id).await, 300);
    }

    #[tokio::test]
    async fn test_multiple_transfer_moves_balance() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Teacher, 1000))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 10))
            .await
            .unwrap();
        let c = storage
            .create_user(new_user(33333333, UserRole::Student, 20))
            .await
            .unwrap();

        let receipt = storage
            .execute_transfer(plan(a.id, &[(b.id, 100), (c.id, 250)]), RequestOrigin::default())
            .await
            .unwrap();

        assert_eq!(receipt.transfer.transfer_type, TransferType::Multiple);
        assert_eq!(receipt.sender_balance, 650);
        assert_eq!(balance(&storage, b.id).await, 110);
        assert_eq!(balance(&storage, c.id).await, 270);

        let detail = storage
            .get_transfer_detail(receipt.transfer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.sender.id, a.id);
        assert_eq!(detail.recipients.len(), 2);
        assert_eq!(detail.recipients[1].amount, 250);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_everything_untouched() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Student, 100))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 5))
            .await
            .unwrap();

        let err = storage
            .execute_transfer(plan(a.id, &[(b.id, 101)]), RequestOrigin::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E014");

        assert_eq!(balance(&storage, a.id).await, 100);
        assert_eq!(balance(&storage, b.id).await, 5);
        let history = storage
            .list_transfers_with_pagination(TransferListQuery::default())
            .await
            .unwrap();
        assert_eq!(history.pagination.total, 0);
        let logs = storage
            .list_activity_logs_with_pagination(ActivityListQuery::default())
            .await
            .unwrap();
        assert_eq!(logs.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_credit_past_max_balance_rolls_back() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Teacher, 1000))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 10))
            .await
            .unwrap();
        let rich = storage
            .create_user(new_user(33333333, UserRole::Student, i64::MAX - 50))
            .await
            .unwrap();

        let err = storage
            .execute_transfer(
                plan(a.id, &[(b.id, 100), (rich.id, 51)]),
                RequestOrigin::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        assert_eq!(balance(&storage, a.id).await, 1000);
        assert_eq!(balance(&storage, b.id).await, 10);
        assert_eq!(balance(&storage, rich.id).await, i64::MAX - 50);

        storage
            .execute_transfer(plan(a.id, &[(rich.id, 50)]), RequestOrigin::default())
            .await
            .unwrap();
        assert_eq!(balance(&storage, rich.id).await, i64::MAX);
    }

    #[tokio::test]
    async fn test_missing_recipient_rolls_back_debit() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Student, 500))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 0))
            .await
            .unwrap();

        let err = storage
            .execute_transfer(plan(a.id, &[(b.id, 100), (9999, 100)]), RequestOrigin::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E015");
        assert_eq!(balance(&storage, a.id).await, 500);
        assert_eq!(balance(&storage, b.id).await, 0);
    }

    #[tokio::test]
    async fn test_activity_rows_written_in_pairs() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Student, 1000))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 0))
            .await
            .unwrap();
        let c = storage
            .create_user(new_user(33333333, UserRole::Student, 0))
            .await
            .unwrap();

        let origin = RequestOrigin {
            ip_address: Some("192.168.1.10".into()),
            user_agent: Some("tests".into()),
        };
        let receipt = storage
            .execute_transfer(plan(a.id, &[(b.id, 10), (c.id, 20)]), origin)
            .await
            .unwrap();

        let sent = storage
            .list_activity_logs_with_pagination(ActivityListQuery {
                action: Some(ActivityAction::TransferSent),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sent.items.len(), 1);
        assert_eq!(sent.items[0].user_id, Some(a.id));
        let meta = sent.items[0].metadata.clone().unwrap();
        assert_eq!(meta["reference"], receipt.transfer.reference.as_str());
        assert_eq!(meta["amount"], 30);
        assert_eq!(sent.items[0].ip_address.as_deref(), Some("192.168.1.10"));

        let received = storage
            .list_activity_logs_with_pagination(ActivityListQuery {
                action: Some(ActivityAction::TransferReceived),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(received.items.len(), 2);
        assert!(received.items.iter().all(|l| {
            l.metadata.as_ref().unwrap()["reference"] == receipt.transfer.reference.as_str()
        }));
    }

    #[tokio::test]
    async fn test_history_direction_and_stats() {
        let storage = memory_storage().await;
        let a = storage
            .create_user(new_user(11111111, UserRole::Student, 1000))
            .await
            .unwrap();
        let b = storage
            .create_user(new_user(22222222, UserRole::Student, 1000))
            .await
            .unwrap();
        let c = storage
            .create_user(new_user(33333333, UserRole::Student, 0))
            .await
            .unwrap();

        storage
            .execute_transfer(plan(a.id, &[(b.id, 100)]), RequestOrigin::default())
            .await
            .unwrap();
        storage
            .execute_transfer(plan(b.id, &[(a.id, 40), (c.id, 60)]), RequestOrigin::default())
            .await
            .unwrap();
        storage
            .execute_transfer(plan(b.id, &[(c.id, 5)]), RequestOrigin::default())
            .await
            .unwrap();

        let query = |direction| TransferListQuery {
            user_id: Some(a.id),
            direction,
            ..Default::default()
        };
        let sent = storage
            .list_transfers_with_pagination(query(TransferDirection::Sent))
            .await
            .unwrap();
        assert_eq!(sent.pagination.total, 1);
        let received = storage
            .list_transfers_with_pagination(query(TransferDirection::Received))
            .await
            .unwrap();
        assert_eq!(received.pagination.total, 1);
        let all = storage
            .list_transfers_with_pagination(query(TransferDirection::All))
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);
        // newest first
        assert_eq!(all.items[0].sender.id, b.id);

        let stats = storage.get_transfer_stats(a.id).await.unwrap();
        assert_eq!(stats.total_sent, 100);
        assert_eq!(stats.sent_count, 1);
        assert_eq!(stats.total_received, 40);
        assert_eq!(stats.received_count, 1);
        assert_eq!(stats.balance, 940);

        let everyone = storage
            .list_transfers_with_pagination(TransferListQuery::default())
            .await
            .unwrap();
        assert_eq!(everyone.pagination.total, 3);
    }
}
