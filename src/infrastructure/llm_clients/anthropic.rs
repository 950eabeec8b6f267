use super::http::{read_error_body, read_json, send_with_timeout};
use super::{LLMClient, GENERATION_TEMPERATURE};
use crate::domain::error::{AppError, Result};
use crate::domain::generation::ProviderResponse;
use crate::domain::llm_config::{dedup_and_sort_models, LLMProvider, ModelInfo};
use crate::infrastructure::config::LlmSettingsStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// No structured output mode: the schema only reaches the model through the
/// user prompt.
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    settings: Arc<LlmSettingsStore>,
    timeout: Duration,
}

impl AnthropicClient {
    pub fn new(base_url: &str, settings: Arc<LlmSettingsStore>, timeout: Duration) -> Self {
        Self {
            client: super::http::build_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
            timeout,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
        request
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
    }
}

#[async_trait]
impl LLMClient for AnthropicClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Anthropic
    }

    fn is_available(&self) -> bool {
        self.settings.get().anthropic_api_key.is_some()
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let Some(api_key) = self.settings.get().anthropic_api_key else {
            return Ok(Vec::new());
        };
        let label = "Anthropic list models request failed";
        let url = format!("{}/v1/models", self.base_url);
        let response = send_with_timeout(
            self.authorized(self.client.get(&url), &api_key),
            self.timeout,
            label,
        )
        .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderListError {
                provider: "Anthropic".to_string(),
                status,
                body,
            });
        }

        let listing: ModelsResponse = read_json(response, self.timeout, label).await?;
        let models = listing
            .data
            .into_iter()
            .filter(|model| model.id.starts_with("claude-"))
            .map(|model| {
                let display_name = model
                    .display_name
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| model.id.clone());
                ModelInfo::new(LLMProvider::Anthropic, &model.id, &display_name)
            })
            .collect();
        Ok(dedup_and_sort_models(models))
    }

    async fn generate(
        &self,
        model: &str,
        system: &str,
        user: &str,
        _schema: &Value,
    ) -> Result<ProviderResponse> {
        let api_key = self
            .settings
            .get()
            .anthropic_api_key
            .ok_or_else(|| AppError::ProviderNotConfigured("anthropic".to_string()))?;

        let label = "Anthropic generate request failed";
        let url = format!("{}/v1/messages", self.base_url);
        let payload = json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": [
                { "role": "user", "content": user }
            ],
            "temperature": GENERATION_TEMPERATURE,
        });

        let response = send_with_timeout(
            self.authorized(self.client.post(&url), &api_key).json(&payload),
            self.timeout,
            label,
        )
        .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderGenerateError {
                provider: "Anthropic".to_string(),
                status,
                body,
            });
        }

        let message: MessagesResponse = read_json(response, self.timeout, label).await?;
        let response_text = message
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<String>();

        Ok(ProviderResponse {
            response_text,
            request_payload: payload,
        })
    }
}
