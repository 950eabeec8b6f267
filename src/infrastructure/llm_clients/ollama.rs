use super::http::{read_error_body, read_json, send_with_timeout};
use super::{LLMClient, GENERATION_TEMPERATURE};
use crate::domain::error::{AppError, Result};
use crate::domain::generation::ProviderResponse;
use crate::domain::llm_config::{dedup_and_sort_models, LLMProvider, ModelInfo};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const CONTEXT_WINDOW: u32 = 8192;

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
    size: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
}

/// Local inference server. Always considered available.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: super::http::build_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Local
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let label = "Ollama list models request failed";
        let url = format!("{}/api/tags", self.base_url);
        let response = send_with_timeout(self.client.get(&url), self.timeout, label).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderListError {
                provider: "Ollama".to_string(),
                status,
                body,
            });
        }

        let tags: OllamaTagsResponse = read_json(response, self.timeout, label).await?;
        let models = tags
            .models
            .into_iter()
            .map(|model| {
                let mut info = ModelInfo::new(LLMProvider::Local, &model.name, &model.name);
                info.size_bytes = model.size;
                info
            })
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
        let label = "Ollama generate request failed";
        let url = format!("{}/api/generate", self.base_url);
        let payload = json!({
            "model": model,
            "system": system,
            "prompt": user,
            "format": schema,
            "stream": false,
            "options": {
                "temperature": GENERATION_TEMPERATURE,
                "num_ctx": CONTEXT_WINDOW,
            },
        });

        let response =
            send_with_timeout(self.client.post(&url).json(&payload), self.timeout, label).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderGenerateError {
                provider: "Ollama".to_string(),
                status,
                body,
            });
        }

        let body: OllamaGenerateResponse = read_json(response, self.timeout, label).await?;
        Ok(ProviderResponse {
            response_text: body.response.unwrap_or_default(),
            request_payload: payload,
        })
    }
}
