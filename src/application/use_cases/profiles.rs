use crate::domain::error::{AppError, Result};
use crate::domain::profile::{Profile, ProfileInput, ProfileUpdate};
use crate::infrastructure::db::profiles::ProfileRepository;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct ProfileUseCase {
    repository: Arc<ProfileRepository>,
}

impl ProfileUseCase {
    pub fn new(repository: Arc<ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_profile(&self, mut input: ProfileInput) -> Result<Profile> {
        input.name = input.name.trim().to_string();
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let profile = self.repository.create_profile(&input, now).await?;
        info!(profile_id = profile.id, "Created profile");
        Ok(profile)
    }

    pub async fn get_profile(&self, profile_id: i64) -> Result<Profile> {
        self.repository.get_profile(profile_id).await
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.repository.list_profiles().await
    }

    pub async fn update_profile(
        &self,
        profile_id: i64,
        mut update: ProfileUpdate,
    ) -> Result<Profile> {
        if update.is_empty() {
            return Err(AppError::ValidationError(
                "At least one profile field is required.".to_string(),
            ));
        }
        update.name = update.name.map(|name| name.trim().to_string());
        update
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        self.repository
            .update_profile(profile_id, &update, now)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::connection::init_design_db;

    async fn use_case() -> ProfileUseCase {
        let pool = init_design_db("sqlite::memory:").await.unwrap();
        ProfileUseCase::new(Arc::new(ProfileRepository::new(pool)))
    }

    fn input(name: &str) -> ProfileInput {
        ProfileInput {
            name: name.to_string(),
            terminology_text: "SKU = stock keeping unit".to_string(),
            style_text: String::new(),
            custom_system_prompt: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_profile() {
        let profiles = use_case().await;
        let created = profiles.create_profile(input("  Storefront ")).await.unwrap();
        assert_eq!(created.name, "Storefront");

        let loaded = profiles.get_profile(created.id).await.unwrap();
        assert_eq!(loaded.terminology_text, "SKU = stock keeping unit");
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let profiles = use_case().await;
        assert!(matches!(
            profiles.create_profile(input("   ")).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let profiles = use_case().await;
        let created = profiles.create_profile(input("Storefront")).await.unwrap();

        let updated = profiles
            .update_profile(
                created.id,
                ProfileUpdate {
                    style_text: Some("Use imperative steps.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Storefront");
        assert_eq!(updated.style_text, "Use imperative steps.");
        assert_eq!(updated.terminology_text, "SKU = stock keeping unit");
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let profiles = use_case().await;
        let created = profiles.create_profile(input("Storefront")).await.unwrap();
        assert!(matches!(
            profiles
                .update_profile(created.id, ProfileUpdate::default())
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let profiles = use_case().await;
        assert!(matches!(
            profiles.get_profile(42).await,
            Err(AppError::NotFound(_))
        ));
        let update = ProfileUpdate {
            name: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            profiles.update_profile(42, update).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_by_last_update() {
        let profiles = use_case().await;
        let first = profiles.create_profile(input("First")).await.unwrap();
        let second = profiles.create_profile(input("Second")).await.unwrap();
        let listed = profiles.list_profiles().await.unwrap();
        assert_eq!(listed.len(), 2);
        if first.updated_at == second.updated_at {
            assert_eq!(listed[0].id, second.id);
        }
    }
}
