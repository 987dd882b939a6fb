use super::SeaOrmStorage;
use crate::entity::institutions::{ActiveModel, Column, Entity as Institutions};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    institutions::{
        entities::Institution,
        requests::{CreateInstitutionRequest, InstitutionListQuery, UpdateInstitutionRequest},
        responses::InstitutionListResponse,
    },
};
use crate::utils::contains_literal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    pub async fn create_institution_impl(
        &self,
        req: CreateInstitutionRequest,
    ) -> Result<Institution> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            rut: Set(req.rut),
            address: Set(req.address),
            phone: Set(req.phone),
            email: Set(req.email),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al crear institución: {e}"))
        })?;

        Ok(result.into_institution())
    }

    pub async fn get_institution_by_id_impl(&self, id: i64) -> Result<Option<Institution>> {
        let result = Institutions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar institución: {e}"))
            })?;

        Ok(result.map(|m| m.into_institution()))
    }

    pub async fn list_institutions_with_pagination_impl(
        &self,
        query: InstitutionListQuery,
    ) -> Result<InstitutionListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Institutions::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(contains_literal(Column::Name, search))
                    .add(contains_literal(Column::Rut, search)),
            );
        }

        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        let paginator = select
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar instituciones: {e}"))
        })?;
        let items = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al listar instituciones: {e}"))
        })?;

        Ok(InstitutionListResponse {
            items: items.into_iter().map(|m| m.into_institution()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_institution_impl(
        &self,
        id: i64,
        update: UpdateInstitutionRequest,
    ) -> Result<Option<Institution>> {
        if self.get_institution_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(rut) = update.rut {
            model.rut = Set(Some(rut));
        }
        if let Some(address) = update.address {
            model.address = Set(Some(address));
        }
        if let Some(phone) = update.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(email) = update.email {
            model.email = Set(Some(email));
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model.update(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al actualizar institución: {e}"))
        })?;

        self.get_institution_by_id_impl(id).await
    }

    pub async fn delete_institution_impl(&self, id: i64) -> Result<bool> {
        let result = Institutions::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al eliminar institución: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::memory_storage;
    use crate::models::institutions::requests::{
        CreateInstitutionRequest, InstitutionListQuery, UpdateInstitutionRequest,
    };
    use crate::storage::Storage;

    fn institution(name: &str) -> CreateInstitutionRequest {
        CreateInstitutionRequest {
            name: name.into(),
            rut: None,
            address: None,
            phone: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_institution_lifecycle() {
        let storage = memory_storage().await;
        let created = storage
            .create_institution(institution("Liceo Bicentenario"))
            .await
            .unwrap();
        assert!(created.is_active);

        let updated = storage
            .update_institution(
                created.id,
                UpdateInstitutionRequest {
                    is_active: Some(false),
                    address: Some("Av. Matta 123".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.address.as_deref(), Some("Av. Matta 123"));
        assert_eq!(updated.name, "Liceo Bicentenario");

        let active = storage
            .list_institutions_with_pagination(InstitutionListQuery {
                is_active: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.pagination.total, 0);

        assert!(storage.delete_institution(created.id).await.unwrap());
        assert!(
            storage
                .get_institution_by_id(created.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let storage = memory_storage().await;
        storage
            .create_institution(institution("Colegio Andes"))
            .await
            .unwrap();
        let err = storage
            .create_institution(institution("Colegio Andes"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }
}
