use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub institution_id: Option<i64>,
    pub course_id: Option<i64>,
    pub enrollment_year: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "SetNull"
    )]
    Course,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Joins the student row with its user account
    pub fn into_student(
        self,
        user: super::users::Model,
    ) -> crate::models::students::entities::Student {
        use super::timestamp_to_datetime;
        use crate::models::users::entities::UserStatus;

        crate::models::students::entities::Student {
            id: self.id,
            user_id: self.user_id,
            rut: user.rut,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            status: user.status.parse().unwrap_or(UserStatus::Inactive),
            balance: user.balance,
            institution_id: self.institution_id,
            course_id: self.course_id,
            enrollment_year: self.enrollment_year,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}
