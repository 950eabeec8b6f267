use super::assert_valid_url;
use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};
use validator::Validate;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const ENV_KEYS: [&str; 4] = [
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "GEMINI_API_KEY",
    "ANTHROPIC_API_KEY",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_api_key: None,
            anthropic_api_key: None,
        }
    }
}

impl LlmSettings {
    fn normalized(mut self) -> Self {
        self.openai_api_key = clean_key(self.openai_api_key);
        self.gemini_api_key = clean_key(self.gemini_api_key);
        self.anthropic_api_key = clean_key(self.anthropic_api_key);
        self.openai_base_url = match assert_valid_url(&self.openai_base_url, "openai_base_url") {
            Ok(url) => url,
            Err(e) => {
                warn!("Ignoring configured OpenAI base URL: {}", e);
                DEFAULT_OPENAI_BASE_URL.to_string()
            }
        };
        self
    }

    fn summary(&self) -> LlmSettingsSummary {
        LlmSettingsSummary {
            openai_configured: self.openai_api_key.is_some(),
            openai_base_url: self.openai_base_url.clone(),
            gemini_configured: self.gemini_api_key.is_some(),
            anthropic_configured: self.anthropic_api_key.is_some(),
        }
    }
}

/// Partial update; an empty string clears the stored key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LlmSettingsUpdate {
    #[validate(length(max = 500))]
    pub openai_api_key: Option<String>,
    #[validate(length(max = 500))]
    pub openai_base_url: Option<String>,
    #[validate(length(max = 500))]
    pub gemini_api_key: Option<String>,
    #[validate(length(max = 500))]
    pub anthropic_api_key: Option<String>,
}

/// What callers may see about the credentials: flags only, no secrets.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LlmSettingsSummary {
    pub openai_configured: bool,
    pub openai_base_url: String,
    pub gemini_configured: bool,
    pub anthropic_configured: bool,
}

/// Process-wide credential cache. Environment values are overridden by the
/// JSON settings file; the merged result is loaded lazily and kept until
/// invalidated.
pub struct LlmSettingsStore {
    path: Option<PathBuf>,
    cache: RwLock<Option<LlmSettings>>,
}

impl LlmSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            cache: RwLock::new(None),
        }
    }

    /// Store with no backing file or environment; `invalidate` resets it to
    /// defaults.
    pub fn in_memory(settings: LlmSettings) -> Self {
        Self {
            path: None,
            cache: RwLock::new(Some(settings.normalized())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> LlmSettings {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return settings.clone();
            }
        }
        self.reload()
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cache.write() {
            *guard = None;
        }
    }

    pub fn reload(&self) -> LlmSettings {
        let settings = match &self.path {
            Some(path) => load_settings(path),
            None => LlmSettings::default(),
        };
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        settings
    }

    pub fn summary(&self) -> LlmSettingsSummary {
        self.get().summary()
    }

    pub fn update(&self, patch: LlmSettingsUpdate) -> Result<LlmSettingsSummary> {
        patch
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let mut settings = self.get();
        if let Some(key) = patch.openai_api_key {
            settings.openai_api_key = clean_key(Some(key));
        }
        if let Some(key) = patch.gemini_api_key {
            settings.gemini_api_key = clean_key(Some(key));
        }
        if let Some(key) = patch.anthropic_api_key {
            settings.anthropic_api_key = clean_key(Some(key));
        }
        if let Some(base_url) = patch.openai_base_url {
            settings.openai_base_url = if base_url.trim().is_empty() {
                DEFAULT_OPENAI_BASE_URL.to_string()
            } else {
                assert_valid_url(&base_url, "openai_base_url")?
            };
        }

        if let Some(path) = &self.path {
            write_settings(path, &settings)?;
            info!("LLM settings written to {}", path.display());
        }

        let summary = settings.summary();
        let mut guard = self
            .cache
            .write()
            .map_err(|_| AppError::Internal("LLM settings lock poisoned".to_string()))?;
        *guard = Some(settings);
        Ok(summary)
    }
}

fn clean_key(value: Option<String>) -> Option<String> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn load_settings(path: &Path) -> LlmSettings {
    let from_env = Figment::from(Serialized::defaults(LlmSettings::default()))
        .merge(Env::raw().only(&ENV_KEYS));
    let layered = from_env.clone().merge(Json::file(path));

    let settings = match layered.extract::<LlmSettings>() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(
                "Failed to read LLM settings from {}: {}. Using environment only.",
                path.display(),
                e
            );
            from_env.extract::<LlmSettings>().unwrap_or_default()
        }
    };
    settings.normalized()
}

fn write_settings(path: &Path, settings: &LlmSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let body = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Internal(format!("Failed to serialize LLM settings: {}", e)))?;
    std::fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_environment() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("OPENAI_API_KEY", "sk-env");
            jail.set_env("GEMINI_API_KEY", "gm-env");
            jail.create_file(
                "llm-settings.json",
                r#"{ "openai_api_key": "sk-file", "openai_base_url": "https://proxy.test/" }"#,
            )?;

            let store = LlmSettingsStore::new(PathBuf::from("llm-settings.json"));
            let settings = store.get();
            assert_eq!(settings.openai_api_key.as_deref(), Some("sk-file"));
            assert_eq!(settings.gemini_api_key.as_deref(), Some("gm-env"));
            assert_eq!(settings.openai_base_url, "https://proxy.test");
            assert!(settings.anthropic_api_key.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_falls_back_to_environment() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ANTHROPIC_API_KEY", "ak-env");
            jail.create_file("llm-settings.json", "{ not json")?;

            let store = LlmSettingsStore::new(PathBuf::from("llm-settings.json"));
            let summary = store.summary();
            assert!(summary.anthropic_configured);
            assert!(!summary.openai_configured);
            assert_eq!(summary.openai_base_url, DEFAULT_OPENAI_BASE_URL);
            Ok(())
        });
    }

    #[test]
    fn test_cache_survives_until_invalidated() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("llm-settings.json", r#"{ "gemini_api_key": "first" }"#)?;
            let store = LlmSettingsStore::new(PathBuf::from("llm-settings.json"));
            assert_eq!(store.get().gemini_api_key.as_deref(), Some("first"));

            jail.create_file("llm-settings.json", r#"{ "gemini_api_key": "second" }"#)?;
            assert_eq!(store.get().gemini_api_key.as_deref(), Some("first"));

            store.invalidate();
            assert_eq!(store.get().gemini_api_key.as_deref(), Some("second"));
            Ok(())
        });
    }

    #[test]
    fn test_update_writes_file_and_cache() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let store = LlmSettingsStore::new(PathBuf::from("conf/llm-settings.json"));
            let summary = store
                .update(LlmSettingsUpdate {
                    openai_api_key: Some("  sk-new  ".to_string()),
                    openai_base_url: Some("http://localhost:8080/".to_string()),
                    ..Default::default()
                })
                .expect("update");
            assert!(summary.openai_configured);
            assert_eq!(summary.openai_base_url, "http://localhost:8080");

            let written = std::fs::read_to_string("conf/llm-settings.json").expect("file");
            assert!(written.contains("sk-new"));

            store.invalidate();
            assert_eq!(store.get().openai_api_key.as_deref(), Some("sk-new"));

            store
                .update(LlmSettingsUpdate {
                    openai_api_key: Some(String::new()),
                    ..Default::default()
                })
                .expect("clear");
            assert!(!store.summary().openai_configured);
            Ok(())
        });
    }

    #[test]
    fn test_update_rejects_non_http_base_url() {
        let store = LlmSettingsStore::in_memory(LlmSettings::default());
        let result = store.update(LlmSettingsUpdate {
            openai_base_url: Some("file:///etc/passwd".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(store.summary().openai_base_url, DEFAULT_OPENAI_BASE_URL);
    }
}
