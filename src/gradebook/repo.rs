use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use super::repo_types::{AssessmentType, MarkOutcome, MarkRow, MarkUpsert, SheetStudent};
use crate::{
    academics::{repo::ALLOCATION_VIEW_SELECT, repo_types::AllocationView},
    db::PgStore,
    error::StoreError,
};

#[async_trait]
pub trait GradebookRepo: Send + Sync {
    async fn list_teacher_allocations(
        &self,
        teacher_id: Uuid,
    ) -> Result<Vec<AllocationView>, StoreError>;
    async fn find_allocation(&self, id: Uuid) -> Result<Option<AllocationView>, StoreError>;
    /// Students currently placed in `stream_id`, by name.
    async fn students_in_stream(
        &self,
        stream_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SheetStudent>, StoreError>;
    async fn marks_for(
        &self,
        allocation_id: Uuid,
        assessment: AssessmentType,
    ) -> Result<Vec<MarkRow>, StoreError>;
    /// Inserts or updates every mark in one transaction. A failing row is
    /// rolled back on its own and reported; the others still commit.
    async fn upsert_marks(
        &self,
        allocation_id: Uuid,
        assessment: AssessmentType,
        marks: &[MarkUpsert],
    ) -> Result<Vec<MarkOutcome>, StoreError>;
}

#[async_trait]
impl GradebookRepo for PgStore {
    async fn list_teacher_allocations(
        &self,
        teacher_id: Uuid,
    ) -> Result<Vec<AllocationView>, StoreError> {
        let rows = sqlx::query_as::<_, AllocationView>(&format!(
            "{ALLOCATION_VIEW_SELECT} WHERE a.teacher_id = $1 ORDER BY cl.level, st.name, sub.name"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_allocation(&self, id: Uuid) -> Result<Option<AllocationView>, StoreError> {
        let row = sqlx::query_as::<_, AllocationView>(&format!(
            "{ALLOCATION_VIEW_SELECT} WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn students_in_stream(
        &self,
        stream_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SheetStudent>, StoreError> {
        let rows = sqlx::query_as::<_, SheetStudent>(
            r#"
            SELECT id, full_name, student_id_human
              FROM students
             WHERE current_stream_id = $1
             ORDER BY full_name
             LIMIT $2
            "#,
        )
        .bind(stream_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn marks_for(
        &self,
        allocation_id: Uuid,
        assessment: AssessmentType,
    ) -> Result<Vec<MarkRow>, StoreError> {
        let rows = sqlx::query_as::<_, MarkRow>(
            r#"
            SELECT student_id, score
              FROM marks
             WHERE teacher_allocation_id = $1 AND assessment_type = $2
            "#,
        )
        .bind(allocation_id)
        .bind(assessment.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_marks(
        &self,
        allocation_id: Uuid,
        assessment: AssessmentType,
        marks: &[MarkUpsert],
    ) -> Result<Vec<MarkOutcome>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(marks.len());

        for mark in marks {
            sqlx::query("SAVEPOINT mark_row").execute(&mut *tx).await?;
            let res = sqlx::query(
                r#"
                INSERT INTO marks (student_id, teacher_allocation_id, assessment_type, score)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (student_id, teacher_allocation_id, assessment_type)
                DO UPDATE SET score = EXCLUDED.score, updated_at = now()
                "#,
            )
            .bind(mark.student_id)
            .bind(allocation_id)
            .bind(assessment.as_str())
            .bind(mark.score)
            .execute(&mut *tx)
            .await;

            match res {
                Ok(_) => {
                    sqlx::query("RELEASE SAVEPOINT mark_row")
                        .execute(&mut *tx)
                        .await?;
                    outcomes.push(MarkOutcome {
                        student_id: mark.student_id,
                        error: None,
                    });
                }
                Err(e) => {
                    let err = StoreError::from(e);
                    if matches!(err, StoreError::Unavailable(_)) {
                        return Err(err);
                    }
                    warn!(error = %err, student_id = %mark.student_id, "mark row rejected");
                    sqlx::query("ROLLBACK TO SAVEPOINT mark_row")
                        .execute(&mut *tx)
                        .await?;
                    outcomes.push(MarkOutcome {
                        student_id: mark.student_id,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        tx.commit().await?;
        Ok(outcomes)
    }
}
