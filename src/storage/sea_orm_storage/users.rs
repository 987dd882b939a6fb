use super::SeaOrmStorage;
use crate::entity::students::{
    ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as Students,
};
use crate::entity::teachers::{
    ActiveModel as TeacherActiveModel, Column as TeacherColumn, Entity as Teachers,
};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    transfers::responses::RecipientSearchResponse,
    users::{
        entities::{User, UserRole, UserStatus},
        requests::{NewUser, UserListQuery, UserUpdate},
        responses::UserListResponse,
    },
};
use crate::utils::contains_literal;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// Keeps the `students` / `teachers` row in line with the user's role
async fn sync_profile_rows<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    role: &UserRole,
    now: i64,
) -> std::result::Result<(), sea_orm::DbErr> {
    if *role != UserRole::Student {
        Students::delete_many()
            .filter(StudentColumn::UserId.eq(user_id))
            .exec(db)
            .await?;
    }
    if *role != UserRole::Teacher {
        Teachers::delete_many()
            .filter(TeacherColumn::UserId.eq(user_id))
            .exec(db)
            .await?;
    }

    match role {
        UserRole::Student => {
            let exists = Students::find()
                .filter(StudentColumn::UserId.eq(user_id))
                .count(db)
                .await?
                > 0;
            if !exists {
                StudentActiveModel {
                    user_id: Set(user_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }
        UserRole::Teacher => {
            let exists = Teachers::find()
                .filter(TeacherColumn::UserId.eq(user_id))
                .count(db)
                .await?
                > 0;
            if !exists {
                TeacherActiveModel {
                    user_id: Set(user_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }
        UserRole::Admin => {}
    }
    Ok(())
}

impl SeaOrmStorage {
    pub async fn create_user_impl(&self, req: NewUser) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al crear usuario: {e}")))?;

        let model = ActiveModel {
            rut: Set(req.rut),
            email: Set(req.email),
            password_hash: Set(req.password_hash),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            phone: Set(req.phone),
            avatar_url: Set(None),
            balance: Set(req.balance),
            email_notifications: Set(true),
            transfer_notifications: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let user = model
            .insert(&txn)
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al crear usuario: {e}")))?;

        match req.role {
            UserRole::Student => {
                StudentActiveModel {
                    user_id: Set(user.id),
                    institution_id: Set(req.institution_id),
                    course_id: Set(req.course_id),
                    enrollment_year: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| {
                    BancarizateError::database_operation(format!("Error al crear estudiante: {e}"))
                })?;
            }
            UserRole::Teacher => {
                TeacherActiveModel {
                    user_id: Set(user.id),
                    institution_id: Set(req.institution_id),
                    specialty: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| {
                    BancarizateError::database_operation(format!("Error al crear profesor: {e}"))
                })?;
            }
            UserRole::Admin => {}
        }

        txn.commit()
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al crear usuario: {e}")))?;

        Ok(user.into_user())
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al buscar usuario: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    pub async fn get_user_by_rut_impl(&self, rut: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Rut.eq(rut))
            .one(&self.db)
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al buscar usuario: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al buscar usuario: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = std::cmp::max(query.page.unwrap_or(1), 1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(user_search_condition(search.trim()));
        }

        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar usuarios: {e}"))
        })?;

        let users = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al listar usuarios: {e}"))
        })?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn list_all_users_impl(&self) -> Result<Vec<User>> {
        let users = Users::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al listar usuarios: {e}"))
            })?;

        Ok(users.into_iter().map(|m| m.into_user()).collect())
    }

    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find().count(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar usuarios: {e}"))
        })
    }

    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!(
                    "Error al registrar último acceso: {e}"
                ))
            })?;

        Ok(result.rows_affected > 0)
    }

    pub async fn update_user_impl(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        if self.get_user_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(password_hash) = update.password_hash {
            model.password_hash = Set(password_hash);
        }
        let new_role = update.role;
        if let Some(ref role) = new_role {
            model.role = Set(role.to_string());
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(first_name) = update.first_name {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name {
            model.last_name = Set(last_name);
        }
        if let Some(phone) = update.phone {
            model.phone = Set(Some(phone).filter(|p| !p.is_empty()));
        }
        if let Some(avatar_url) = update.avatar_url {
            model.avatar_url = Set(Some(avatar_url).filter(|a| !a.is_empty()));
        }
        if let Some(email_notifications) = update.email_notifications {
            model.email_notifications = Set(email_notifications);
        }
        if let Some(transfer_notifications) = update.transfer_notifications {
            model.transfer_notifications = Set(transfer_notifications);
        }

        let update_err =
            |e: sea_orm::DbErr| BancarizateError::database_operation(format!("Error al actualizar usuario: {e}"));

        let txn = self.db.begin().await.map_err(update_err)?;
        model.update(&txn).await.map_err(update_err)?;
        if let Some(role) = new_role {
            sync_profile_rows(&txn, id, &role, now).await.map_err(update_err)?;
        }
        txn.commit().await.map_err(update_err)?;

        self.get_user_by_id_impl(id).await
    }

    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id).exec(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al eliminar usuario: {e}"))
        })?;

        Ok(result.rows_affected > 0)
    }

    pub async fn adjust_balance_impl(&self, id: i64, amount: i64) -> Result<Option<User>> {
        let now = chrono::Utc::now().timestamp();

        // 0 <= balance + amount <= i64::MAX, checked in the same statement as the write
        let bound = if amount >= 0 {
            Column::Balance.lte(i64::MAX - amount)
        } else {
            let floor = amount.checked_neg().ok_or_else(|| {
                BancarizateError::validation("Monto de ajuste fuera de rango")
            })?;
            Column::Balance.gte(floor)
        };

        let result = Users::update_many()
            .col_expr(Column::Balance, Expr::col(Column::Balance).add(amount))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(bound)
            .exec(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al ajustar saldo: {e}"))
            })?;

        if result.rows_affected == 0 {
            return match self.get_user_by_id_impl(id).await? {
                Some(_) if amount > 0 => Err(BancarizateError::validation(
                    "El ajuste excede el saldo máximo permitido",
                )),
                Some(user) => Err(BancarizateError::insufficient_funds(format!(
                    "El ajuste dejaría el saldo negativo (saldo actual: {})",
                    user.balance
                ))),
                None => Ok(None),
            };
        }

        self.get_user_by_id_impl(id).await
    }

    pub async fn existing_ruts_impl(&self, ruts: &[String]) -> Result<Vec<String>> {
        if ruts.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<String> = Users::find()
            .select_only()
            .column(Column::Rut)
            .filter(Column::Rut.is_in(ruts.iter().cloned()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| BancarizateError::database_operation(format!("Error al buscar RUTs: {e}")))?;
        Ok(found)
    }

    pub async fn existing_emails_impl(&self, emails: &[String]) -> Result<Vec<String>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<String> = Users::find()
            .select_only()
            .column(Column::Email)
            .filter(Column::Email.is_in(emails.iter().cloned()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar correos: {e}"))
            })?;
        Ok(found)
    }

    pub async fn search_recipients_impl(
        &self,
        exclude_user_id: i64,
        search: Option<String>,
        page: i64,
        size: i64,
    ) -> Result<RecipientSearchResponse> {
        let page = std::cmp::max(page, 1) as u64;
        let size = size.clamp(1, 100) as u64;

        let mut select = Users::find()
            .filter(Column::Id.ne(exclude_user_id))
            .filter(Column::Status.eq(UserStatus::Active.to_string()));

        if let Some(ref search) = search
            && !search.trim().is_empty()
        {
            select = select.filter(user_search_condition(search.trim()));
        }

        let paginator = select
            .order_by_asc(Column::LastName)
            .order_by_asc(Column::FirstName)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al buscar destinatarios: {e}"))
        })?;
        let users = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al buscar destinatarios: {e}"))
        })?;

        Ok(RecipientSearchResponse {
            items: users.into_iter().map(|m| m.into_public_user()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }
}

/// RUT, email or either name containing `search`.
///
/// A RUT-looking term is also matched in canonical form so `12.345.678`
/// finds `12345678-5`.
fn user_search_condition(search: &str) -> Condition {
    let mut cond = Condition::any()
        .add(contains_literal(Column::Rut, search))
        .add(contains_literal(Column::Email, search))
        .add(contains_literal(Column::FirstName, search))
        .add(contains_literal(Column::LastName, search));

    let compact: String = search
        .chars()
        .filter(|c| !matches!(c, '.' | ' '))
        .collect();
    if compact != search && !compact.is_empty() {
        cond = cond.add(contains_literal(Column::Rut, &compact));
    }
    cond
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, new_user, rut_for};
    use crate::models::users::{
        entities::{UserRole, UserStatus},
        requests::{UserListQuery, UserUpdate},
    };
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_user_crud() {
        let storage = memory_storage().await;

        let created = storage
            .create_user(new_user(12345678, UserRole::Student, 500))
            .await
            .unwrap();
        assert_eq!(created.rut, "12345678-5");
        assert_eq!(created.balance, 500);
        assert_eq!(created.status, UserStatus::Active);

        let by_rut = storage.get_user_by_rut("12345678-5").await.unwrap().unwrap();
        assert_eq!(by_rut.id, created.id);
        let by_email = storage
            .get_user_by_email("u12345678@test.cl")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);

        let updated = storage
            .update_user(
                created.id,
                UserUpdate {
                    first_name: Some("Ana".into()),
                    status: Some(UserStatus::Suspended),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.first_name, "Ana");
        assert_eq!(updated.status, UserStatus::Suspended);
        assert_eq!(updated.last_name, created.last_name);

        assert!(storage.delete_user(created.id).await.unwrap());
        assert!(storage.get_user_by_id(created.id).await.unwrap().is_none());
        assert!(!storage.delete_user(created.id).await.unwrap());
        assert!(
            storage
                .update_user(created.id, UserUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_rut_is_unique_violation() {
        let storage = memory_storage().await;
        storage
            .create_user(new_user(11111111, UserRole::Admin, 0))
            .await
            .unwrap();

        let mut dup = new_user(11111111, UserRole::Teacher, 0);
        dup.email = "other@test.cl".into();
        let err = storage.create_user(dup).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_profile_rows_follow_role() {
        let storage = memory_storage().await;
        let student = storage
            .create_user(new_user(20000001, UserRole::Student, 0))
            .await
            .unwrap();
        let teacher = storage
            .create_user(new_user(20000002, UserRole::Teacher, 0))
            .await
            .unwrap();
        storage
            .create_user(new_user(20000003, UserRole::Admin, 0))
            .await
            .unwrap();

        let students = storage
            .list_students_with_pagination(Default::default())
            .await
            .unwrap();
        assert_eq!(students.items.len(), 1);
        assert_eq!(students.items[0].user_id, student.id);

        let found = storage.get_teacher_by_user_id(teacher.id).await.unwrap();
        assert!(found.is_some());
        assert!(storage.get_teacher_by_user_id(student.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_role_change_moves_profile_row() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user(20000004, UserRole::Student, 0))
            .await
            .unwrap();

        let updated = storage
            .update_user(
                user.id,
                UserUpdate {
                    role: Some(UserRole::Teacher),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, UserRole::Teacher);
        assert!(storage.get_teacher_by_user_id(user.id).await.unwrap().is_some());

        let students = storage
            .list_students_with_pagination(Default::default())
            .await
            .unwrap();
        assert!(students.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_search() {
        let storage = memory_storage().await;
        for (body, role) in [
            (10000001, UserRole::Student),
            (10000002, UserRole::Student),
            (10000003, UserRole::Teacher),
        ] {
            storage.create_user(new_user(body, role, 0)).await.unwrap();
        }

        let students = storage
            .list_users_with_pagination(UserListQuery {
                role: Some(UserRole::Student),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 2);

        let search = storage
            .list_users_with_pagination(UserListQuery {
                search: Some("10.000.003".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.items.len(), 1);
        assert_eq!(search.items[0].rut, rut_for(10000003));

        // LIKE wildcards in the term are literal
        let wildcard = storage
            .list_users_with_pagination(UserListQuery {
                search: Some("%".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(wildcard.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_adjust_balance_never_negative() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user(12345678, UserRole::Student, 100))
            .await
            .unwrap();

        let credited = storage.adjust_balance(user.id, 50).await.unwrap().unwrap();
        assert_eq!(credited.balance, 150);

        let debited = storage.adjust_balance(user.id, -150).await.unwrap().unwrap();
        assert_eq!(debited.balance, 0);

        let err = storage.adjust_balance(user.id, -1).await.unwrap_err();
        assert_eq!(err.code(), "E014");
        let after = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(after.balance, 0);

        assert!(storage.adjust_balance(9999, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjust_balance_rejects_out_of_range() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user(12345678, UserRole::Student, 100))
            .await
            .unwrap();

        let err = storage.adjust_balance(user.id, i64::MAX).await.unwrap_err();
        assert_eq!(err.code(), "E007");
        let err = storage.adjust_balance(user.id, i64::MIN).await.unwrap_err();
        assert_eq!(err.code(), "E007");

        let after = storage.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(after.balance, 100);

        let topped = storage
            .adjust_balance(user.id, i64::MAX - 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(topped.balance, i64::MAX);
    }

    #[tokio::test]
    async fn test_recipient_search_excludes_caller_and_inactive() {
        let storage = memory_storage().await;
        let me = storage
            .create_user(new_user(30000001, UserRole::Student, 0))
            .await
            .unwrap();
        let other = storage
            .create_user(new_user(30000002, UserRole::Student, 0))
            .await
            .unwrap();
        let inactive = storage
            .create_user(new_user(30000003, UserRole::Student, 0))
            .await
            .unwrap();
        storage
            .update_user(
                inactive.id,
                UserUpdate {
                    status: Some(UserStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let found = storage
            .search_recipients(me.id, Some("3000".into()), 1, 10)
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].id, other.id);
    }

    #[tokio::test]
    async fn test_existing_ruts_and_emails() {
        let storage = memory_storage().await;
        storage
            .create_user(new_user(12345678, UserRole::Student, 0))
            .await
            .unwrap();

        let ruts = storage
            .existing_ruts(&[rut_for(12345678), rut_for(87654321)])
            .await
            .unwrap();
        assert_eq!(ruts, vec![rut_for(12345678)]);

        let emails = storage
            .existing_emails(&["nobody@test.cl".to_string()])
            .await
            .unwrap();
        assert!(emails.is_empty());
    }
}
