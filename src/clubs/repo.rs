use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Club, ClubColumns, NewClub};
use crate::{db::PgStore, error::StoreError};

#[async_trait]
pub trait ClubRepo: Send + Sync {
    /// Reads which optional club columns the live schema carries.
    async fn detect_club_columns(&self) -> Result<ClubColumns, StoreError>;
    async fn list_clubs(&self, columns: &ClubColumns) -> Result<Vec<Club>, StoreError>;
    /// Writes only the columns `columns` reports as present.
    async fn insert_club(&self, club: &NewClub, columns: &ClubColumns) -> Result<Club, StoreError>;
    /// Adds a membership row and bumps the club's member count together.
    async fn enroll_student(&self, club_id: Uuid, student_id: Uuid) -> Result<(), StoreError>;
}

fn projection(columns: &ClubColumns) -> String {
    let opt = |present: bool, name: &str| {
        if present {
            name.to_string()
        } else {
            format!("NULL::text AS {name}")
        }
    };
    format!(
        "id, name, {}, {}, {}, member_count",
        opt(columns.category, "category"),
        opt(columns.description, "description"),
        opt(columns.meeting_day, "meeting_day"),
    )
}

#[async_trait]
impl ClubRepo for PgStore {
    async fn detect_club_columns(&self) -> Result<ClubColumns, StoreError> {
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT column_name::text
              FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = 'clubs'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ClubColumns::from_names(names.iter().map(|(n,)| n.as_str())))
    }

    async fn list_clubs(&self, columns: &ClubColumns) -> Result<Vec<Club>, StoreError> {
        let rows = sqlx::query_as::<_, Club>(&format!(
            "SELECT {} FROM clubs ORDER BY name",
            projection(columns)
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_club(&self, club: &NewClub, columns: &ClubColumns) -> Result<Club, StoreError> {
        let (club, _) = columns.fit(club);
        let mut names = vec!["name"];
        if columns.category {
            names.push("category");
        }
        if columns.meeting_day {
            names.push("meeting_day");
        }
        if columns.description {
            names.push("description");
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO clubs ({}) VALUES (", names.join(", ")));
        let mut values = qb.separated(", ");
        values.push_bind(club.name);
        if columns.category {
            values.push_bind(club.category);
        }
        if columns.meeting_day {
            values.push_bind(club.meeting_day);
        }
        if columns.description {
            values.push_bind(club.description);
        }
        qb.push(format!(") RETURNING {}", projection(columns)));

        let row = qb.build_query_as::<Club>().fetch_one(&self.pool).await?;
        Ok(row)
    }

    async fn enroll_student(&self, club_id: Uuid, student_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO club_members (club_id, student_id, role) VALUES ($1, $2, 'member')",
        )
        .bind(club_id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
        let res = sqlx::query("UPDATE clubs SET member_count = member_count + 1 WHERE id = $1")
            .bind(club_id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }
}
