use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    academics::AcademicsRepo, admissions::AdmissionsRepo, auth::ProfileRepo, clubs::ClubRepo,
    config::AppConfig, error::StoreError, events::EventRepo, gradebook::GradebookRepo,
    houses::HouseRepo,
};

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl HealthRepo for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Everything the HTTP layer needs from storage.
pub trait SchoolStore:
    HealthRepo
    + ProfileRepo
    + AcademicsRepo
    + AdmissionsRepo
    + ClubRepo
    + EventRepo
    + GradebookRepo
    + HouseRepo
{
}

impl<T> SchoolStore for T where
    T: HealthRepo
        + ProfileRepo
        + AcademicsRepo
        + AdmissionsRepo
        + ClubRepo
        + EventRepo
        + GradebookRepo
        + HouseRepo
{
}
