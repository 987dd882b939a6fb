use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub reference: String,
    pub sender_id: i64,
    pub total_amount: i64,
    pub description: Option<String>,
    pub transfer_type: String,
    pub status: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SenderId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
    #[sea_orm(has_many = "super::transfer_recipients::Entity")]
    TransferRecipients,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sender.def()
    }
}

impl Related<super::transfer_recipients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransferRecipients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_transfer(self) -> crate::models::transfers::entities::Transfer {
        use super::timestamp_to_datetime;
        use crate::models::transfers::entities::{Transfer, TransferStatus, TransferType};

        Transfer {
            id: self.id,
            reference: self.reference,
            sender_id: self.sender_id,
            total_amount: self.total_amount,
            description: self.description,
            transfer_type: self
                .transfer_type
                .parse()
                .unwrap_or(TransferType::Multiple),
            status: self.status.parse().unwrap_or(TransferStatus::Completed),
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}
