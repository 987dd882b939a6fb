use crate::models::{
    activity::{
        entities::ActivityLog,
        requests::{ActivityListQuery, NewActivityLog},
        responses::ActivityListResponse,
    },
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    institutions::{
        entities::Institution,
        requests::{CreateInstitutionRequest, InstitutionListQuery, UpdateInstitutionRequest},
        responses::InstitutionListResponse,
    },
    students::{
        entities::Student,
        requests::{StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    system::{entities::SystemSetting, responses::SystemStats},
    teachers::{
        entities::Teacher,
        requests::{TeacherListQuery, UpdateTeacherRequest},
        responses::TeacherListResponse,
    },
    transfers::{
        requests::{RequestOrigin, TransferListQuery, TransferPlan},
        responses::{
            RecipientSearchResponse, TransferDetail, TransferListResponse, TransferReceipt,
            TransferStats,
        },
    },
    users::{
        entities::User,
        requests::{NewUser, UserListQuery, UserUpdate},
        responses::UserListResponse,
    },
};

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::Result;
use std::sync::Arc;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    // Users
    /// Inserts the user and, for students/teachers, the matching profile row
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    /// `rut` must be canonical (`12345678-5`)
    async fn get_user_by_rut(&self, rut: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    /// Every user ordered by id, for exports
    async fn list_all_users(&self) -> Result<Vec<User>>;
    async fn count_users(&self) -> Result<u64>;
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>>;
    async fn delete_user(&self, id: i64) -> Result<bool>;
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    /// Adds `amount` (may be negative) to the balance; fails with
    /// `InsufficientFunds` if the result would go below zero
    async fn adjust_balance(&self, id: i64, amount: i64) -> Result<Option<User>>;
    /// Subset of `ruts` already registered
    async fn existing_ruts(&self, ruts: &[String]) -> Result<Vec<String>>;
    /// Subset of `emails` already registered
    async fn existing_emails(&self, emails: &[String]) -> Result<Vec<String>>;
    /// Active users matching RUT, name or email, excluding `exclude_user_id`
    async fn search_recipients(
        &self,
        exclude_user_id: i64,
        search: Option<String>,
        page: i64,
        size: i64,
    ) -> Result<RecipientSearchResponse>;

    // Institutions
    async fn create_institution(&self, req: CreateInstitutionRequest) -> Result<Institution>;
    async fn get_institution_by_id(&self, id: i64) -> Result<Option<Institution>>;
    async fn list_institutions_with_pagination(
        &self,
        query: InstitutionListQuery,
    ) -> Result<InstitutionListResponse>;
    async fn update_institution(
        &self,
        id: i64,
        update: UpdateInstitutionRequest,
    ) -> Result<Option<Institution>>;
    async fn delete_institution(&self, id: i64) -> Result<bool>;

    // Courses
    async fn create_course(&self, req: CreateCourseRequest) -> Result<Course>;
    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    async fn update_course(&self, id: i64, update: UpdateCourseRequest)
    -> Result<Option<Course>>;
    async fn delete_course(&self, id: i64) -> Result<bool>;

    // Students
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;

    // Teachers
    async fn get_teacher_by_id(&self, id: i64) -> Result<Option<Teacher>>;
    async fn get_teacher_by_user_id(&self, user_id: i64) -> Result<Option<Teacher>>;
    async fn list_teachers_with_pagination(
        &self,
        query: TeacherListQuery,
    ) -> Result<TeacherListResponse>;
    async fn update_teacher(
        &self,
        id: i64,
        update: UpdateTeacherRequest,
    ) -> Result<Option<Teacher>>;

    // Transfers
    /// Applies the plan atomically: debit, credits, transfer rows and the
    /// paired activity entries commit together or not at all
    async fn execute_transfer(
        &self,
        plan: TransferPlan,
        origin: RequestOrigin,
    ) -> Result<TransferReceipt>;
    async fn get_transfer_detail(&self, id: i64) -> Result<Option<TransferDetail>>;
    async fn list_transfers_with_pagination(
        &self,
        query: TransferListQuery,
    ) -> Result<TransferListResponse>;
    async fn get_transfer_stats(&self, user_id: i64) -> Result<TransferStats>;

    // Activity
    async fn create_activity_log(&self, log: NewActivityLog) -> Result<ActivityLog>;
    async fn list_activity_logs_with_pagination(
        &self,
        query: ActivityListQuery,
    ) -> Result<ActivityListResponse>;
    /// Newest first, at most `limit` rows, ignores paging fields
    async fn export_activity_logs(
        &self,
        query: ActivityListQuery,
        limit: u64,
    ) -> Result<Vec<ActivityLog>>;

    // System config
    async fn list_all_settings(&self) -> Result<Vec<SystemSetting>>;
    async fn get_setting_by_key(&self, key: &str) -> Result<Option<SystemSetting>>;
    async fn update_setting(&self, key: &str, value: &str, user_id: i64)
    -> Result<SystemSetting>;

    // Health / stats
    async fn ping(&self) -> Result<()>;
    async fn get_system_stats(&self) -> Result<SystemStats>;
}

/// Storage for the loaded `[database]` section
pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    storage_from_config(&AppConfig::get().database).await
}

/// Connects and runs migrations
pub async fn storage_from_config(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    let storage =
        sea_orm_storage::SeaOrmStorage::connect(&config.url, config.pool_size, config.timeout)
            .await?;
    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_storage_from_config_memory() {
        let config = DatabaseConfig {
            url: ":memory:".to_string(),
            pool_size: 1,
            timeout: 5,
        };
        let storage = storage_from_config(&config).await.unwrap();
        storage.ping().await.unwrap();
        assert_eq!(storage.count_users().await.unwrap(), 0);
    }
}
