use super::SeaOrmStorage;
use crate::entity::system_config::{ActiveModel, Column, Entity as SystemConfig};
use crate::errors::{BancarizateError, Result};
use crate::models::system::entities::{SettingValueType, SystemSetting};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn list_all_settings_impl(&self) -> Result<Vec<SystemSetting>> {
        let rows = SystemConfig::find()
            .order_by_asc(Column::Key)
            .all(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al leer configuración: {e}"))
            })?;

        Ok(rows.into_iter().map(|m| m.into_setting()).collect())
    }

    pub async fn get_setting_by_key_impl(&self, key: &str) -> Result<Option<SystemSetting>> {
        let row = SystemConfig::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al leer configuración: {e}"))
            })?;

        Ok(row.map(|m| m.into_setting()))
    }

    /// Rejects unknown keys and values that do not parse as the row's type
    pub async fn update_setting_impl(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
    ) -> Result<SystemSetting> {
        let existing = self
            .get_setting_by_key_impl(key)
            .await?
            .ok_or_else(|| BancarizateError::not_found(format!("Configuración '{key}' no existe")))?;

        let value = match existing.value_type {
            SettingValueType::String => value.to_string(),
            _ => value.trim().to_string(),
        };
        existing
            .value_type
            .check(&value)
            .map_err(BancarizateError::validation)?;

        let model = ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(chrono::Utc::now().timestamp()),
            updated_by: Set(Some(user_id)),
            ..Default::default()
        };

        let updated = model.update(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al guardar configuración: {e}"))
        })?;

        Ok(updated.into_setting())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::memory_storage;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_seeded_defaults() {
        let storage = memory_storage().await;
        let max = storage
            .get_setting_by_key("transfer.max_recipients")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(max.value, "20");
        assert!(storage.get_setting_by_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_checks_type_and_key() {
        let storage = memory_storage().await;

        let updated = storage
            .update_setting("transfer.max_amount", " 5000 ", 1)
            .await
            .unwrap();
        assert_eq!(updated.value, "5000");
        assert_eq!(updated.updated_by, Some(1));

        let err = storage
            .update_setting("transfer.max_amount", "mucho", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let err = storage.update_setting("no.such.key", "1", 1).await.unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}
