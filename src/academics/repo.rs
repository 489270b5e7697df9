use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{
    AcademicYear, AllocationView, ClassLevel, NewAllocation, NewClassLevel, NewStream, NewSubject,
    NewTerm, NewYear, Stream, Subject, TeacherAllocation, Term,
};
use crate::{db::PgStore, error::StoreError};

/// Reference data, the academic calendar and teacher allocations.
#[async_trait]
pub trait AcademicsRepo: Send + Sync {
    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError>;
    async fn insert_subjects(&self, subjects: &[NewSubject]) -> Result<Vec<Subject>, StoreError>;

    async fn list_class_levels(&self) -> Result<Vec<ClassLevel>, StoreError>;
    async fn insert_class_levels(
        &self,
        levels: &[NewClassLevel],
    ) -> Result<Vec<ClassLevel>, StoreError>;

    async fn list_streams(&self) -> Result<Vec<Stream>, StoreError>;
    async fn find_stream(&self, id: Uuid) -> Result<Option<Stream>, StoreError>;
    async fn insert_streams(&self, streams: &[NewStream]) -> Result<Vec<Stream>, StoreError>;

    /// Years, most recent start date first.
    async fn list_years(&self) -> Result<Vec<AcademicYear>, StoreError>;
    async fn find_year(&self, id: Uuid) -> Result<Option<AcademicYear>, StoreError>;
    async fn current_year(&self) -> Result<Option<AcademicYear>, StoreError>;
    /// Inserts the year and, when `make_current`, moves the current-year
    /// pointer to it in the same transaction.
    async fn insert_year(&self, year: &NewYear, make_current: bool)
        -> Result<AcademicYear, StoreError>;
    /// Single write to the current-year pointer.
    async fn set_current_year(&self, year_id: Uuid) -> Result<(), StoreError>;

    async fn list_terms(&self, year_id: Uuid) -> Result<Vec<Term>, StoreError>;
    async fn find_term(&self, id: Uuid) -> Result<Option<Term>, StoreError>;
    /// Current term of the current year.
    async fn current_term(&self) -> Result<Option<Term>, StoreError>;
    async fn insert_term(&self, term: &NewTerm, make_current: bool) -> Result<Term, StoreError>;
    /// Single write to the owning year's current-term pointer.
    async fn set_current_term(&self, year_id: Uuid, term_id: Uuid) -> Result<(), StoreError>;

    async fn insert_allocation(
        &self,
        allocation: &NewAllocation,
    ) -> Result<TeacherAllocation, StoreError>;
    async fn list_recent_allocations(&self, limit: i64)
        -> Result<Vec<AllocationView>, StoreError>;
}

const YEAR_SELECT: &str = r#"
    SELECT y.id, y.name, y.start_date, y.end_date, y.current_term_id,
           COALESCE(y.id = s.current_year_id, false) AS is_current
      FROM academic_years y
      LEFT JOIN school_settings s ON s.id = 1
"#;

const TERM_SELECT: &str = r#"
    SELECT t.id, t.academic_year_id, t.name, t.start_date, t.end_date,
           COALESCE(t.id = y.current_term_id, false) AS is_current
      FROM terms t
      JOIN academic_years y ON y.id = t.academic_year_id
"#;

/// Shared with the gradebook, which filters by teacher.
pub(crate) const ALLOCATION_VIEW_SELECT: &str = r#"
    SELECT a.id, a.teacher_id, COALESCE(p.full_name, 'Unknown') AS teacher_name,
           a.subject_id, COALESCE(sub.name, 'Unknown Subject') AS subject_name,
           COALESCE(sub.code, '') AS subject_code,
           a.stream_id, COALESCE(st.name, '') AS stream_name,
           COALESCE(cl.name, '') AS class_name,
           a.academic_year_id, a.created_at
      FROM teacher_allocations a
      LEFT JOIN profiles p ON p.id = a.teacher_id
      LEFT JOIN subjects sub ON sub.id = a.subject_id
      LEFT JOIN streams st ON st.id = a.stream_id
      LEFT JOIN class_levels cl ON cl.id = st.class_id
"#;

const SET_CURRENT_YEAR: &str = r#"
    INSERT INTO school_settings (id, current_year_id, updated_at)
    VALUES (1, $1, now())
    ON CONFLICT (id) DO UPDATE
       SET current_year_id = EXCLUDED.current_year_id, updated_at = now()
"#;

#[async_trait]
impl AcademicsRepo for PgStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let rows = sqlx::query_as::<_, Subject>(
            "SELECT id, name, code, level FROM subjects ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_subjects(&self, subjects: &[NewSubject]) -> Result<Vec<Subject>, StoreError> {
        if subjects.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO subjects (name, code, level) ");
        qb.push_values(subjects, |mut b, s| {
            b.push_bind(s.name.clone())
                .push_bind(s.code.clone())
                .push_bind(s.level.clone());
        });
        qb.push(" RETURNING id, name, code, level");
        let rows = qb.build_query_as::<Subject>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn list_class_levels(&self) -> Result<Vec<ClassLevel>, StoreError> {
        let rows = sqlx::query_as::<_, ClassLevel>(
            "SELECT id, name, level FROM class_levels ORDER BY level",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_class_levels(
        &self,
        levels: &[NewClassLevel],
    ) -> Result<Vec<ClassLevel>, StoreError> {
        if levels.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO class_levels (name, level) ");
        qb.push_values(levels, |mut b, l| {
            b.push_bind(l.name.clone()).push_bind(l.level);
        });
        qb.push(" RETURNING id, name, level");
        let rows = qb.build_query_as::<ClassLevel>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn list_streams(&self) -> Result<Vec<Stream>, StoreError> {
        let rows =
            sqlx::query_as::<_, Stream>("SELECT id, name, class_id FROM streams ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn find_stream(&self, id: Uuid) -> Result<Option<Stream>, StoreError> {
        let row = sqlx::query_as::<_, Stream>("SELECT id, name, class_id FROM streams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_streams(&self, streams: &[NewStream]) -> Result<Vec<Stream>, StoreError> {
        if streams.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO streams (name, class_id) ");
        qb.push_values(streams, |mut b, s| {
            b.push_bind(s.name.clone()).push_bind(s.class_id);
        });
        qb.push(" RETURNING id, name, class_id");
        let rows = qb.build_query_as::<Stream>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn list_years(&self) -> Result<Vec<AcademicYear>, StoreError> {
        let rows = sqlx::query_as::<_, AcademicYear>(&format!(
            "{YEAR_SELECT} ORDER BY y.start_date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_year(&self, id: Uuid) -> Result<Option<AcademicYear>, StoreError> {
        let row = sqlx::query_as::<_, AcademicYear>(&format!("{YEAR_SELECT} WHERE y.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn current_year(&self) -> Result<Option<AcademicYear>, StoreError> {
        let row = sqlx::query_as::<_, AcademicYear>(&format!(
            "{YEAR_SELECT} WHERE y.id = s.current_year_id"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_year(
        &self,
        year: &NewYear,
        make_current: bool,
    ) -> Result<AcademicYear, StoreError> {
        let mut tx = self.pool.begin().await?;
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO academic_years (name, start_date, end_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&year.name)
        .bind(year.start_date)
        .bind(year.end_date)
        .fetch_one(&mut *tx)
        .await?;

        if make_current {
            sqlx::query(SET_CURRENT_YEAR).bind(id).execute(&mut *tx).await?;
        }

        let created = sqlx::query_as::<_, AcademicYear>(&format!("{YEAR_SELECT} WHERE y.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn set_current_year(&self, year_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(SET_CURRENT_YEAR)
            .bind(year_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_terms(&self, year_id: Uuid) -> Result<Vec<Term>, StoreError> {
        let rows = sqlx::query_as::<_, Term>(&format!(
            "{TERM_SELECT} WHERE t.academic_year_id = $1 ORDER BY t.start_date"
        ))
        .bind(year_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_term(&self, id: Uuid) -> Result<Option<Term>, StoreError> {
        let row = sqlx::query_as::<_, Term>(&format!("{TERM_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn current_term(&self) -> Result<Option<Term>, StoreError> {
        let row = sqlx::query_as::<_, Term>(&format!(
            r#"{TERM_SELECT}
            JOIN school_settings s ON s.id = 1 AND s.current_year_id = y.id
            WHERE t.id = y.current_term_id"#
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_term(&self, term: &NewTerm, make_current: bool) -> Result<Term, StoreError> {
        let mut tx = self.pool.begin().await?;
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO terms (academic_year_id, name, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(term.academic_year_id)
        .bind(&term.name)
        .bind(term.start_date)
        .bind(term.end_date)
        .fetch_one(&mut *tx)
        .await?;

        if make_current {
            sqlx::query("UPDATE academic_years SET current_term_id = $2 WHERE id = $1")
                .bind(term.academic_year_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let created = sqlx::query_as::<_, Term>(&format!("{TERM_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn set_current_term(&self, year_id: Uuid, term_id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE academic_years SET current_term_id = $2 WHERE id = $1")
            .bind(year_id)
            .bind(term_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_allocation(
        &self,
        allocation: &NewAllocation,
    ) -> Result<TeacherAllocation, StoreError> {
        let row = sqlx::query_as::<_, TeacherAllocation>(
            r#"
            INSERT INTO teacher_allocations (teacher_id, subject_id, stream_id, academic_year_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, teacher_id, subject_id, stream_id, academic_year_id, created_at
            "#,
        )
        .bind(allocation.teacher_id)
        .bind(allocation.subject_id)
        .bind(allocation.stream_id)
        .bind(allocation.academic_year_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_recent_allocations(
        &self,
        limit: i64,
    ) -> Result<Vec<AllocationView>, StoreError> {
        let rows = sqlx::query_as::<_, AllocationView>(&format!(
            "{ALLOCATION_VIEW_SELECT} ORDER BY a.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
