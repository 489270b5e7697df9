use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewUser, Profile, ProfileRow, Role, UserRecord, UserRow};
use crate::{db::PgStore, error::StoreError};

/// Credentials and profiles.
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;
    /// Create credentials. The database provisioning trigger normally creates
    /// the matching profile in the same statement.
    async fn create_user(&self, new: &NewUser) -> Result<UserRecord, StoreError>;
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError>;
    async fn list_profiles_by_role(&self, role: Role) -> Result<Vec<Profile>, StoreError>;
}

const USER_COLUMNS: &str = "id, email, password_hash, meta_full_name, meta_role, created_at";
const PROFILE_COLUMNS: &str = "id, email, full_name, role, avatar_url";

#[async_trait]
impl ProfileRepo for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create_user(&self, new: &NewUser) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, meta_full_name, meta_role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.full_name.as_deref())
        .bind(new.role.map(Role::as_str))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (id, email, full_name, role, avatar_url, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role.as_str())
        .bind(profile.avatar_url.as_deref())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn list_profiles_by_role(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = $1 ORDER BY full_name"
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Profile::try_from)
        .collect()
    }
}
