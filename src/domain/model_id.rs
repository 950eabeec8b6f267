use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMProvider;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const MAX_MODEL_NAME_LEN: usize = 200;

static MODEL_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._:/+-]+$").unwrap());

/// A `provider:model` pair. Bare names without a provider prefix resolve to
/// the local provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: LLMProvider,
    pub model: String,
}

impl ModelId {
    pub fn parse(raw: &str) -> Result<Self> {
        let model_id = raw.trim();
        if model_id.is_empty() {
            return Err(AppError::InvalidIdentifier("Model ID is empty".to_string()));
        }

        let separator = match model_id.find(':') {
            Some(index) if index > 0 => index,
            _ => {
                validate_model_name(model_id)?;
                return Ok(Self {
                    provider: LLMProvider::Local,
                    model: model_id.to_string(),
                });
            }
        };

        let provider_raw = &model_id[..separator];
        let model = model_id[separator + 1..].trim();

        let provider = LLMProvider::from_tag(provider_raw)
            .ok_or_else(|| AppError::UnknownProvider(provider_raw.to_string()))?;

        validate_model_name(model)?;
        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.tag(), self.model)
    }
}

fn validate_model_name(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::InvalidModelName("Model name is empty".to_string()));
    }
    if value.chars().count() > MAX_MODEL_NAME_LEN {
        return Err(AppError::InvalidModelName(
            "Model name is too long".to_string(),
        ));
    }
    if !MODEL_NAME_PATTERN.is_match(value) {
        return Err(AppError::InvalidModelName(
            "Model name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
