use super::http::{read_error_body, read_json, send_with_timeout};
use super::schema::constrained_schema;
use super::{LLMClient, GENERATION_TEMPERATURE};
use crate::domain::error::{AppError, Result};
use crate::domain::generation::ProviderResponse;
use crate::domain::llm_config::{dedup_and_sort_models, LLMProvider, ModelInfo};
use crate::infrastructure::config::LlmSettingsStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const MAX_LIST_PAGES: usize = 5;

#[derive(Serialize)]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelInfo {
    #[serde(default)]
    name: String,
    base_model_id: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    settings: Arc<LlmSettingsStore>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(base_url: &str, settings: Arc<LlmSettingsStore>, timeout: Duration) -> Self {
        Self {
            client: super::http::build_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
            timeout,
        }
    }

    fn to_model_info(model: GeminiModelInfo) -> Option<ModelInfo> {
        if !model
            .supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
        {
            return None;
        }
        let base_model_id = model
            .base_model_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| {
                model
                    .name
                    .strip_prefix("models/")
                    .unwrap_or(model.name.as_str())
                    .to_string()
            });
        if base_model_id.is_empty() {
            return None;
        }
        let display_name = model
            .display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| base_model_id.clone());
        Some(ModelInfo::new(
            LLMProvider::Gemini,
            &base_model_id,
            &display_name,
        ))
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    fn provider(&self) -> LLMProvider {
        LLMProvider::Gemini
    }

    fn is_available(&self) -> bool {
        self.settings.get().gemini_api_key.is_some()
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let Some(api_key) = self.settings.get().gemini_api_key else {
            return Ok(Vec::new());
        };
        let label = "Gemini list models request failed";
        let url = format!("{}/models", self.base_url);

        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_LIST_PAGES {
            let mut query = vec![("key", api_key.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let response =
                send_with_timeout(self.client.get(&url).query(&query), self.timeout, label)
                    .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = read_error_body(response).await;
                return Err(AppError::ProviderListError {
                    provider: "Gemini".to_string(),
                    status,
                    body,
                });
            }

            let page: GeminiModelsResponse = read_json(response, self.timeout, label).await?;
            models.extend(page.models.into_iter().filter_map(Self::to_model_info));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(dedup_and_sort_models(models))
    }

    async fn generate(
        &self,
        model: &str,
        system: &str,
        user: &str,
        schema: &Value,
    ) -> Result<ProviderResponse> {
        let api_key = self
            .settings
            .get()
            .gemini_api_key
            .ok_or_else(|| AppError::ProviderNotConfigured("gemini".to_string()))?;

        let label = "Gemini generate request failed";
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: user.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: GENERATION_TEMPERATURE,
                response_mime_type: "application/json".to_string(),
                response_schema: constrained_schema(schema),
            },
        };
        let payload = serde_json::to_value(&body)
            .map_err(|e| AppError::Internal(format!("Failed to encode Gemini request: {}", e)))?;

        let response = send_with_timeout(
            self.client
                .post(&url)
                .query(&[("key", api_key.as_str())])
                .json(&payload),
            self.timeout,
            label,
        )
        .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = read_error_body(response).await;
            return Err(AppError::ProviderGenerateError {
                provider: "Gemini".to_string(),
                status,
                body,
            });
        }

        let json: GeminiResponse = read_json(response, self.timeout, label).await?;
        let response_text = json
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .unwrap_or_default();

        Ok(ProviderResponse {
            response_text,
            request_payload: payload,
        })
    }
}
