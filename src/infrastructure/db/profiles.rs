use crate::domain::error::{AppError, Result};
use crate::domain::profile::{Profile, ProfileInput, ProfileUpdate};
use sqlx::SqlitePool;

pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_profile(&self, input: &ProfileInput, now: i64) -> Result<Profile> {
        let result = sqlx::query(
            "INSERT INTO profiles (name, terminology_text, style_text, custom_system_prompt, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(&input.terminology_text)
        .bind(&input.style_text)
        .bind(&input.custom_system_prompt)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert profile: {e}")))?;

        self.get_profile(result.last_insert_rowid()).await
    }

    pub async fn get_profile(&self, profile_id: i64) -> Result<Profile> {
        let profile = sqlx::query_as::<_, ProfileEntity>(
            "SELECT id, name, terminology_text, style_text, custom_system_prompt, created_at, updated_at
             FROM profiles WHERE id = ?",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch profile: {e}")))?;

        match profile {
            Some(profile) => Ok(profile.into()),
            None => Err(AppError::NotFound(format!(
                "Profile not found: {}",
                profile_id
            ))),
        }
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, ProfileEntity>(
            "SELECT id, name, terminology_text, style_text, custom_system_prompt, created_at, updated_at
             FROM profiles ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list profiles: {e}")))?;

        Ok(profiles.into_iter().map(|profile| profile.into()).collect())
    }

    pub async fn update_profile(
        &self,
        profile_id: i64,
        update: &ProfileUpdate,
        now: i64,
    ) -> Result<Profile> {
        let result = sqlx::query(
            "UPDATE profiles SET
                name = COALESCE(?, name),
                terminology_text = COALESCE(?, terminology_text),
                style_text = COALESCE(?, style_text),
                custom_system_prompt = COALESCE(?, custom_system_prompt),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.terminology_text)
        .bind(&update.style_text)
        .bind(&update.custom_system_prompt)
        .bind(now)
        .bind(profile_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update profile: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Profile not found: {}",
                profile_id
            )));
        }
        self.get_profile(profile_id).await
    }
}

#[derive(sqlx::FromRow)]
struct ProfileEntity {
    id: i64,
    name: String,
    terminology_text: String,
    style_text: String,
    custom_system_prompt: String,
    created_at: i64,
    updated_at: i64,
}

impl From<ProfileEntity> for Profile {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            terminology_text: entity.terminology_text,
            style_text: entity.style_text,
            custom_system_prompt: entity.custom_system_prompt,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
