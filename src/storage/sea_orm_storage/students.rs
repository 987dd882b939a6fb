use super::SeaOrmStorage;
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{BancarizateError, Result};
use crate::models::{
    PaginationInfo,
    students::{
        entities::Student,
        requests::{StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
};
use crate::utils::contains_literal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar estudiante: {e}"))
            })?;

        Ok(result.and_then(|(student, user)| user.map(|u| student.into_student(u))))
    }

    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Students::find().find_also_related(Users);

        if let Some(institution_id) = query.institution_id {
            select = select.filter(Column::InstitutionId.eq(institution_id));
        }

        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
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
                    .add(contains_literal(UserColumn::LastName, search)),
            );
        }

        let paginator = select
            .order_by_asc(UserColumn::LastName)
            .order_by_asc(UserColumn::FirstName)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al contar estudiantes: {e}"))
        })?;
        let rows = paginator.fetch_page(page - 1).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al listar estudiantes: {e}"))
        })?;

        Ok(StudentListResponse {
            items: rows
                .into_iter()
                .filter_map(|(student, user)| user.map(|u| student.into_student(u)))
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        if Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                BancarizateError::database_operation(format!("Error al buscar estudiante: {e}"))
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
        if let Some(course_id) = update.course_id {
            model.course_id = Set(Some(course_id));
        }
        if let Some(enrollment_year) = update.enrollment_year {
            model.enrollment_year = Set(Some(enrollment_year));
        }

        model.update(&self.db).await.map_err(|e| {
            BancarizateError::database_operation(format!("Error al actualizar estudiante: {e}"))
        })?;

        self.get_student_by_id_impl(id).await
    }
}
