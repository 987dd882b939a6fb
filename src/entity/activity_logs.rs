use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// JSON text
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_activity_log(self) -> crate::models::activity::entities::ActivityLog {
        crate::models::activity::entities::ActivityLog {
            id: self.id,
            user_id: self.user_id,
            action: self.action,
            description: self.description,
            metadata: self
                .metadata
                .and_then(|m| serde_json::from_str(&m).ok()),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: super::timestamp_to_datetime(self.created_at),
        }
    }
}
