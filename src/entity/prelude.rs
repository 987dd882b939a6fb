pub use super::activity_logs::{
    ActiveModel as ActivityLogActiveModel, Entity as ActivityLogs, Model as ActivityLogModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::institutions::{
    ActiveModel as InstitutionActiveModel, Entity as Institutions, Model as InstitutionModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::system_config::{
    ActiveModel as SystemConfigActiveModel, Entity as SystemConfig, Model as SystemConfigModel,
};
pub use super::teachers::{
    ActiveModel as TeacherActiveModel, Entity as Teachers, Model as TeacherModel,
};
pub use super::transfer_recipients::{
    ActiveModel as TransferRecipientActiveModel, Entity as TransferRecipients,
    Model as TransferRecipientModel,
};
pub use super::transfers::{
    ActiveModel as TransferActiveModel, Entity as Transfers, Model as TransferModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
