use async_trait::async_trait;
use time::Date;

use super::repo_types::{Audience, EventRow, NewEvent, SchoolEvent};
use crate::{db::PgStore, error::StoreError};

#[async_trait]
pub trait EventRepo: Send + Sync {
    /// Events ordered by date, earliest first.
    async fn list_events(&self, audience: Option<Audience>) -> Result<Vec<SchoolEvent>, StoreError>;
    /// Events targeted at any of `audiences`, on or after `from` when given.
    async fn list_events_for(
        &self,
        audiences: &[Audience],
        from: Option<Date>,
        limit: i64,
    ) -> Result<Vec<SchoolEvent>, StoreError>;
    async fn insert_event(&self, event: &NewEvent) -> Result<SchoolEvent, StoreError>;
}

const EVENT_COLUMNS: &str = "id, title, event_date, location, audience, description";

fn convert(rows: Vec<EventRow>) -> Result<Vec<SchoolEvent>, StoreError> {
    rows.into_iter().map(SchoolEvent::try_from).collect()
}

#[async_trait]
impl EventRepo for PgStore {
    async fn list_events(&self, audience: Option<Audience>) -> Result<Vec<SchoolEvent>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"SELECT {EVENT_COLUMNS} FROM school_events
               WHERE ($1::text IS NULL OR audience = $1)
               ORDER BY event_date ASC"#
        ))
        .bind(audience.map(Audience::as_str))
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn list_events_for(
        &self,
        audiences: &[Audience],
        from: Option<Date>,
        limit: i64,
    ) -> Result<Vec<SchoolEvent>, StoreError> {
        let audiences: Vec<String> = audiences.iter().map(|a| a.to_string()).collect();
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"SELECT {EVENT_COLUMNS} FROM school_events
               WHERE audience = ANY($1)
                 AND ($2::date IS NULL OR event_date >= $2)
               ORDER BY event_date ASC
               LIMIT $3"#
        ))
        .bind(audiences)
        .bind(from)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<SchoolEvent, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"INSERT INTO school_events (title, event_date, location, audience, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {EVENT_COLUMNS}"#
        ))
        .bind(&event.title)
        .bind(event.event_date)
        .bind(&event.location)
        .bind(event.audience.as_str())
        .bind(&event.description)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }
}
