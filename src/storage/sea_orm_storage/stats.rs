use super::SeaOrmStorage;
use super::transfers::sum_i64;
use crate::entity::prelude::{Courses, Institutions, Transfers, Users};
use crate::entity::users::Column as UserColumn;
use crate::errors::{BancarizateError, Result};
use crate::models::{
    system::responses::SystemStats,
    users::entities::{UserRole, UserStatus},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn count_err(e: sea_orm::DbErr) -> BancarizateError {
    BancarizateError::database_operation(format!("Error al calcular estadísticas: {e}"))
}

impl SeaOrmStorage {
    pub async fn ping_impl(&self) -> Result<()> {
        self.db.ping().await.map_err(|e| {
            BancarizateError::database_connection(format!("Base de datos no disponible: {e}"))
        })
    }

    pub async fn get_system_stats_impl(&self) -> Result<SystemStats> {
        let by_role = |role: UserRole| Users::find().filter(UserColumn::Role.eq(role.to_string()));

        let total_users = Users::find().count(&self.db).await.map_err(count_err)?;
        let active_users = Users::find()
            .filter(UserColumn::Status.eq(UserStatus::Active.to_string()))
            .count(&self.db)
            .await
            .map_err(count_err)?;
        let admins = by_role(UserRole::Admin)
            .count(&self.db)
            .await
            .map_err(count_err)?;
        let teachers = by_role(UserRole::Teacher)
            .count(&self.db)
            .await
            .map_err(count_err)?;
        let students = by_role(UserRole::Student)
            .count(&self.db)
            .await
            .map_err(count_err)?;
        let institutions = Institutions::find()
            .count(&self.db)
            .await
            .map_err(count_err)?;
        let courses = Courses::find().count(&self.db).await.map_err(count_err)?;
        let transfers = Transfers::find().count(&self.db).await.map_err(count_err)?;

        let total_transferred = sum_i64(&self.db, Transfers::find(), "total_amount").await?;
        let total_balance = sum_i64(&self.db, Users::find(), "balance").await?;

        Ok(SystemStats {
            total_users: total_users as i64,
            active_users: active_users as i64,
            admins: admins as i64,
            teachers: teachers as i64,
            students: students as i64,
            institutions: institutions as i64,
            courses: courses as i64,
            transfers: transfers as i64,
            total_transferred,
            total_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, new_user};
    use crate::models::{
        transfers::{
            entities::TransferType,
            requests::{RequestOrigin, TransferPlan, TransferRecipientInput},
        },
        users::entities::UserRole,
    };
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_stats_count_and_sum() {
        let storage = memory_storage().await;
        let empty = storage.get_system_stats().await.unwrap();
        assert_eq!(empty.total_users, 0);
        assert_eq!(empty.total_balance, 0);

        let admin = storage
            .create_user(new_user(11111111, UserRole::Admin, 1000))
            .await
            .unwrap();
        let student = storage
            .create_user(new_user(22222222, UserRole::Student, 500))
            .await
            .unwrap();
        storage
            .execute_transfer(
                TransferPlan {
                    sender_id: admin.id,
                    recipients: vec![TransferRecipientInput {
                        recipient_id: student.id,
                        amount: 200,
                    }],
                    total_amount: 200,
                    description: None,
                    transfer_type: TransferType::Single,
                },
                RequestOrigin::default(),
            )
            .await
            .unwrap();

        let stats = storage.get_system_stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.admins, 1);
        assert_eq!(stats.students, 1);
        assert_eq!(stats.teachers, 0);
        assert_eq!(stats.transfers, 1);
        assert_eq!(stats.total_transferred, 200);
        // transfers conserve the total
        assert_eq!(stats.total_balance, 1500);
    }
}
