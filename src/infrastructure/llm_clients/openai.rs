use super::http::{read_error_body, read_json, send_with_timeout};
use super::schema::strict_schema;
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

const CHAT_MODEL_PREFIXES: [&str; 5] = ["gpt-", "chatgpt-", "o1-", "o3-", "o4-"];

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

pub struct OpenAIClient {
    client: reqwest::Client,
    settings: Arc<LlmSettingsStore>,
    timeout: Duration,
}

impl OpenAIClient {
    pub fn new(settings: Arc<LlmSettingsStore>, timeout: Duration) -> Self {
        Self {
            client: super::http::build_client(),
            settings,
            timeout,
        }
    }

    fn is_chat_model(model_id: &str) -> bool {
        let id = model_id.to_lowercase();
        CHAT_MODEL_PREFIXES
            .iter()
            .any(|prefix| id.starts_with(prefix))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::OpenAI
    }

    fn is_available(&self) -> bool {
        self.settings.get().openai_api_key.is_some()
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let settings = self.settings.get();
        let Some(api_key) = settings.openai_api_key else {
            return Ok(Vec::new());
        };
        let label = "OpenAI list models request failed";
        let url = format!("{}/v1/models", settings.openai_base_url);
        let response = send_with_timeout(
            self.client.get(&url).bearer_auth(api_key),
            self.timeout,
            label,
        )
        .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderListError {
                provider: "OpenAI".to_string(),
                status,
                body,
            });
        }

        let listing: ModelsResponse = read_json(response, self.timeout, label).await?;
        let models = listing
            .data
            .into_iter()
            .filter(|model| Self::is_chat_model(&model.id))
            .map(|model| ModelInfo::new(LLMProvider::OpenAI, &model.id, &model.id))
            .collect();
        Ok(dedup_and_sort_models(models))
    }

    async fn generate(
        &self,
        model: &str,
        system: &str,
        user: &str,
        schema: &Value,
    ) -> Result<ProviderResponse> {
        let settings = self.settings.get();
        let api_key = settings
            .openai_api_key
            .ok_or_else(|| AppError::ProviderNotConfigured("openai".to_string()))?;

        let label = "OpenAI generate request failed";
        let url = format!("{}/v1/chat/completions", settings.openai_base_url);
        let payload = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "test_design_ir",
                    "strict": true,
                    "schema": strict_schema(schema),
                }
            },
            "temperature": GENERATION_TEMPERATURE,
        });

        let response = send_with_timeout(
            self.client.post(&url).bearer_auth(api_key).json(&payload),
            self.timeout,
            label,
        )
        .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderGenerateError {
                provider: "OpenAI".to_string(),
                status,
                body,
            });
        }

        let json: Value = read_json(response, self.timeout, label).await?;
        let response_text = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(ProviderResponse {
            response_text,
            request_payload: payload,
        })
    }
}
