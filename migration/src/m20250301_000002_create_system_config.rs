use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemConfig::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SystemConfig::Value).text().not_null())
                    .col(ColumnDef::new(SystemConfig::ValueType).string().not_null())
                    .col(ColumnDef::new(SystemConfig::Description).text().null())
                    .col(
                        ColumnDef::new(SystemConfig::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SystemConfig::UpdatedBy).big_integer().null())
                    .to_owned(),
            )
            .await?;

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let defaults = [
            ("app.system_name", "Bancarizate", "string", "Nombre del sistema"),
            (
                "transfer.min_amount",
                "1",
                "integer",
                "Monto mínimo por destinatario (CLP)",
            ),
            (
                "transfer.max_amount",
                "1000000",
                "integer",
                "Monto máximo por destinatario (CLP)",
            ),
            (
                "transfer.max_recipients",
                "20",
                "integer",
                "Máximo de destinatarios por transferencia",
            ),
            (
                "users.initial_balance",
                "0",
                "integer",
                "Saldo inicial de cuentas nuevas (CLP)",
            ),
            (
                "jwt.access_token_expiry",
                "30",
                "integer",
                "Vigencia del access token (minutos)",
            ),
        ];

        for (key, value, value_type, description) in defaults {
            let insert = Query::insert()
                .into_table(SystemConfig::Table)
                .columns([
                    SystemConfig::Key,
                    SystemConfig::Value,
                    SystemConfig::ValueType,
                    SystemConfig::Description,
                    SystemConfig::UpdatedAt,
                ])
                .values_panic([
                    key.into(),
                    value.into(),
                    value_type.into(),
                    description.into(),
                    now.into(),
                ])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemConfig::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SystemConfig {
    #[sea_orm(iden = "system_config")]
    Table,
    Key,
    Value,
    ValueType,
    Description,
    UpdatedAt,
    UpdatedBy,
}
