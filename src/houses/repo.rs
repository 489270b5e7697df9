use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{House, NewHouse};
use crate::{db::PgStore, error::StoreError};

#[async_trait]
pub trait HouseRepo: Send + Sync {
    /// Standings, highest points first.
    async fn list_houses(&self) -> Result<Vec<House>, StoreError>;
    async fn insert_house(&self, house: &NewHouse) -> Result<House, StoreError>;
    /// Adds `delta` to the house's points in one statement.
    async fn adjust_points(&self, house_id: Uuid, delta: i32) -> Result<House, StoreError>;
}

#[async_trait]
impl HouseRepo for PgStore {
    async fn list_houses(&self) -> Result<Vec<House>, StoreError> {
        let rows = sqlx::query_as::<_, House>(
            "SELECT id, name, color, points, members FROM houses ORDER BY points DESC, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_house(&self, house: &NewHouse) -> Result<House, StoreError> {
        let row = sqlx::query_as::<_, House>(
            r#"
            INSERT INTO houses (name, color)
            VALUES ($1, $2)
            RETURNING id, name, color, points, members
            "#,
        )
        .bind(&house.name)
        .bind(&house.color)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn adjust_points(&self, house_id: Uuid, delta: i32) -> Result<House, StoreError> {
        let row = sqlx::query_as::<_, House>(
            r#"
            UPDATE houses SET points = points + $2
             WHERE id = $1
            RETURNING id, name, color, points, members
            "#,
        )
        .bind(house_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound)
    }
}
