use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    Local,
    OpenAI,
    Anthropic,
    Gemini,
}

impl LLMProvider {
    pub const ALL: [LLMProvider; 4] = [
        LLMProvider::Local,
        LLMProvider::OpenAI,
        LLMProvider::Anthropic,
        LLMProvider::Gemini,
    ];

    /// Prefix used in compound `provider:model` identifiers.
    pub fn tag(&self) -> &'static str {
        match self {
            LLMProvider::Local => "local",
            LLMProvider::OpenAI => "openai",
            LLMProvider::Anthropic => "anthropic",
            LLMProvider::Gemini => "gemini",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|provider| provider.tag() == tag)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LLMProvider::Local => "Ollama",
            LLMProvider::OpenAI => "OpenAI",
            LLMProvider::Anthropic => "Anthropic",
            LLMProvider::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Model descriptor returned by provider listings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelInfo {
    /// `provider:model`
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub provider: LLMProvider,
    #[serde(rename = "size", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl ModelInfo {
    pub fn new(provider: LLMProvider, bare_id: &str, display_name: &str) -> Self {
        Self {
            id: format!("{}:{}", provider.tag(), bare_id),
            display_name: display_name.to_string(),
            provider,
            size_bytes: None,
        }
    }
}

/// Deduplicates by id (last entry wins) and orders by display name.
pub fn dedup_and_sort_models(models: Vec<ModelInfo>) -> Vec<ModelInfo> {
    let mut unique: Vec<ModelInfo> = Vec::with_capacity(models.len());
    for model in models {
        if let Some(existing) = unique.iter_mut().find(|m| m.id == model.id) {
            *existing = model;
        } else {
            unique.push(model);
        }
    }
    unique.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    unique
}
