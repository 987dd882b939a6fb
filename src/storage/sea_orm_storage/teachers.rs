use super::SeaOrmStorage;
use crate::entity::teachers::{ActiveModel, Column, Entity as Teachers};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    teachers::{
        entities::Teacher,
        requests::{TeacherListQuery, UpdateTeacherRequest},
        responses::TeacherListResponse,
    },
};
use crate::utils::contains_literal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    pub async fn get_teacher_by_id_impl(&self, id: i64) -> Result<Option<Teacher>> {
        let result = Teachers::find_by_id(id)
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar profesor: {e}"))
            })?;

        Ok(result.and_then(|(teacher, user)| user.map(|u| teacher.into_teacher(u))))
    }

    pub async fn get_teacher_by_user_id_impl(&self, user_id: i64) -> Result<Option<Teacher>> {
        let result = Teachers::find()
            .filter(Column::UserId.eq(user_id))
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar profesor: {e}"))
            })?;

        Ok(result.and_then(|(teacher, user)| user.map(|u| teacher.into_teacher(u))))
    }

    pub async fn list_teachers_with_pagination_impl(
        &self,
        query: TeacherListQuery,
    ) -> Result<TeacherListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Teachers::find().find_also_related(Users);

        if let Some(institution_id) = query.institution_id {
            select = select.filter(Column::InstitutionId.eq(institution_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(contains_literal(UserColumn::Rut, search))
                    .add(contains_literal(UserColumn::Email, search))
                    .add(contains_literal(UserColumn::FirstName, search))
                    .add(contains_literal(UserColumn::LastName, search))
                    .add(contains_literal(Column::Specialty, search)),
            );
        }

        let paginator = select
            .order_by_asc(UserColumn::LastName)
            .order_by_asc(UserColumn::FirstName)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar profesores: {e}"))
        })?;
        let rows = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al listar profesores: {e}"))
        })?;

        Ok(TeacherListResponse {
            items: rows
                .into_iter()
                .filter_map(|(teacher, user)| user.map(|u| teacher.into_teacher(u)))
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_teacher_impl(
        &self,
        id: i64,
        update: UpdateTeacherRequest,
    ) -> Result<Option<Teacher>> {
        if Teachers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar profesor: {e}"))
            })?
            .is_none()
        {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(institution_id) = update.institution_id {
            model.institution_id = Set(Some(institution_id));
        }
        if let Some(specialty) = update.specialty {
            model.specialty = Set(Some(specialty).filter(|s| !s.is_empty()));
        }

        model.update(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al actualizar profesor: {e}"))
        })?;

        self.get_teacher_by_id_impl(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, new_user};
    use crate::models::{
        teachers::requests::{TeacherListQuery, UpdateTeacherRequest},
        users::entities::UserRole,
    };
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_teacher_update_and_search() {
        let storage = memory_storage().await;
        let user = storage
            .create_user(new_user(17000001, UserRole::Teacher, 0))
            .await
            .unwrap();
        let teacher = storage.get_teacher_by_user_id(user.id).await.unwrap().unwrap();
        assert_eq!(teacher.rut, user.rut);

        let updated = storage
            .update_teacher(
                teacher.id,
                UpdateTeacherRequest {
                    specialty: Some("Matemáticas".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.specialty.as_deref(), Some("Matemáticas"));

        let found = storage
            .list_teachers_with_pagination(TeacherListQuery {
                search: Some("Matem".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);

        assert!(
            storage
                .update_teacher(9999, UpdateTeacherRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }
}
