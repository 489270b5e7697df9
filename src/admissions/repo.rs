use async_trait::async_trait;

use super::repo_types::{NewStudent, Student};
use crate::{db::PgStore, error::StoreError};

#[async_trait]
pub trait AdmissionsRepo: Send + Sync {
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError>;
}

#[async_trait]
impl AdmissionsRepo for PgStore {
    async fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        let row = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (full_name, student_id_human, gender, current_stream_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, full_name, student_id_human, gender, current_stream_id, created_at
            "#,
        )
        .bind(&student.full_name)
        .bind(&student.student_id_human)
        .bind(student.gender.as_str())
        .bind(student.current_stream_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
