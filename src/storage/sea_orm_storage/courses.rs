use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
};
use crate::utils::contains_literal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    pub async fn create_course_impl(&self, req: CreateCourseRequest) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            institution_id: Set(req.institution_id),
            teacher_id: Set(req.teacher_id),
            name: Set(req.name),
            code: Set(req.code),
            level: Set(req.level),
            year: Set(req.year),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al crear curso: {e}"))
        })?;

        Ok(result.into_course())
    }

    pub async fn get_course_by_id_impl(&self, id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(id).one(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al buscar curso: {e}"))
        })?;

        Ok(result.map(|m| m.into_course()))
    }

    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Courses::find();

        if let Some(institution_id) = query.institution_id {
            select = select.filter(Column::InstitutionId.eq(institution_id));
        }

        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(contains_literal(Column::Name, search))
                    .add(contains_literal(Column::Code, search)),
            );
        }

        let paginator = select
            .order_by_desc(Column::Year)
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar cursos: {e}"))
        })?;
        let items = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al listar cursos: {e}"))
        })?;

        Ok(CourseListResponse {
            items: items.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_course_impl(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(institution_id) = update.institution_id {
            model.institution_id = Set(institution_id);
        }
        if let Some(teacher_id) = update.teacher_id {
            model.teacher_id = Set(Some(teacher_id));
        }
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(code) = update.code {
            model.code = Set(code);
        }
        if let Some(level) = update.level {
            // empty clears
            model.level = Set(Some(level).filter(|l| !l.is_empty()));
        }
        if let Some(year) = update.year {
            model.year = Set(year);
        }

        model.update(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al actualizar curso: {e}"))
        })?;

        self.get_course_by_id_impl(id).await
    }

    pub async fn delete_course_impl(&self, id: i64) -> Result<bool> {
        let result = Courses::delete_by_id(id).exec(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al eliminar curso: {e}"))
        })?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{memory_storage, new_user};
    use crate::models::{
        courses::requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        institutions::requests::CreateInstitutionRequest,
        students::requests::{StudentListQuery, UpdateStudentRequest},
        users::entities::UserRole,
    };
    use crate::storage::Storage;

    async fn seed_institution(storage: &dyn Storage) -> i64 {
        storage
            .create_institution(CreateInstitutionRequest {
                name: "Escuela Arturo Prat".into(),
                rut: None,
                address: None,
                phone: None,
                email: None,
            })
            .await
            .unwrap()
            .id
    }

    fn course(institution_id: i64, code: &str) -> CreateCourseRequest {
        CreateCourseRequest {
            institution_id,
            teacher_id: None,
            name: format!("Curso {code}"),
            code: code.into(),
            level: Some("7° básico".into()),
            year: 2025,
        }
    }

    #[tokio::test]
    async fn test_course_filters_and_update() {
        let storage = memory_storage().await;
        let institution_id = seed_institution(&storage).await;
        let teacher_user = storage
            .create_user(new_user(15000001, UserRole::Teacher, 0))
            .await
            .unwrap();
        let teacher = storage
            .get_teacher_by_user_id(teacher_user.id)
            .await
            .unwrap()
            .unwrap();

        let a = storage.create_course(course(institution_id, "7A")).await.unwrap();
        storage.create_course(course(institution_id, "7B")).await.unwrap();

        storage
            .update_course(
                a.id,
                UpdateCourseRequest {
                    teacher_id: Some(teacher.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let taught = storage
            .list_courses_with_pagination(CourseListQuery {
                teacher_id: Some(teacher.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(taught.items.len(), 1);
        assert_eq!(taught.items[0].code, "7A");

        let all = storage
            .list_courses_with_pagination(CourseListQuery {
                institution_id: Some(institution_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_duplicate_code_and_missing_institution() {
        let storage = memory_storage().await;
        let institution_id = seed_institution(&storage).await;
        storage.create_course(course(institution_id, "8A")).await.unwrap();

        let dup = storage
            .create_course(course(institution_id, "8A"))
            .await
            .unwrap_err();
        assert!(dup.is_unique_violation());

        let orphan = storage.create_course(course(9999, "8B")).await.unwrap_err();
        assert!(orphan.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_deleting_course_unassigns_students() {
        let storage = memory_storage().await;
        let institution_id = seed_institution(&storage).await;
        let c = storage.create_course(course(institution_id, "1M")).await.unwrap();
        let user = storage
            .create_user(new_user(16000001, UserRole::Student, 0))
            .await
            .unwrap();
        let student = storage
            .list_students_with_pagination(StudentListQuery::default())
            .await
            .unwrap()
            .items
            .remove(0);
        assert_eq!(student.user_id, user.id);

        storage
            .update_student(
                student.id,
                UpdateStudentRequest {
                    institution_id: Some(institution_id),
                    course_id: Some(c.id),
                    enrollment_year: Some(2025),
                },
            )
            .await
            .unwrap();

        let in_course = storage
            .list_students_with_pagination(StudentListQuery {
                course_id: Some(c.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_course.items.len(), 1);

        assert!(storage.delete_course(c.id).await.unwrap());
        let after = storage.get_student_by_id(student.id).await.unwrap().unwrap();
        assert!(after.course_id.is_none());
        assert_eq!(after.institution_id, Some(institution_id));
    }
}
