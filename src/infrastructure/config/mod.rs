mod llm_settings;

pub use llm_settings::{LlmSettings, LlmSettingsStore, LlmSettingsSummary, LlmSettingsUpdate};

use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
const CONFIG_FILE: &str = "testdesign.toml";
const ENV_PREFIX: &str = "TESTDESIGN_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub ollama_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub request_timeout_ms: u64,
    pub llm_settings_path: Option<PathBuf>,
    pub rules_dir: Option<PathBuf>,
    /// Comma separated; empty means every origin is accepted.
    pub cors_allowed_origins: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://testdesign.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            ollama_base_url: "http://localhost:11434".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            llm_settings_path: None,
            rules_dir: None,
            cors_allowed_origins: String::new(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `testdesign.toml`, then `PORT`/`OLLAMA_BASE_URL`, then
    /// `TESTDESIGN_*` variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::raw().only(&["PORT", "OLLAMA_BASE_URL"]))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;
        if config.port == 0 {
            return Err(AppError::ValidationError(
                "Configured port must be positive".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| origin.to_string())
            .collect()
    }

    /// Explicit path, else next to the SQLite file, else the working directory.
    pub fn resolve_llm_settings_path(&self) -> PathBuf {
        if let Some(path) = &self.llm_settings_path {
            return path.clone();
        }
        if let Some(db_path) = sqlite_file_path(&self.database_url) {
            if let Some(parent) = db_path.parent() {
                return parent.join("llm-settings.json");
            }
        }
        PathBuf::from("llm-settings.json")
    }
}

fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let raw = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let raw = raw.split('?').next().unwrap_or(raw);
    if raw.is_empty() || raw == ":memory:" {
        return None;
    }
    Some(Path::new(raw).to_path_buf())
}

/// Validates an http(s) URL and strips the trailing slash.
pub fn assert_valid_url(value: &str, field_name: &str) -> Result<String> {
    let trimmed = value.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| AppError::ValidationError(format!("{} is not a valid URL: {}", field_name, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::ValidationError(format!(
            "{} must use http(s)",
            field_name
        )));
    }
    Ok(parsed.to_string().trim_end_matches('/').to_string())
}
