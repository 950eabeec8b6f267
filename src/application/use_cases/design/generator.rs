use super::llm_output::extract_json_payload;
use super::prompts::{build_system_prompt, build_user_prompt};
use super::retry::with_single_retry;
use crate::domain::error::{AppError, Result};
use crate::domain::generation::{GenerationRequest, LlmResult};
use crate::infrastructure::ir_schema::ir_schema;
use crate::infrastructure::llm_clients::ProviderRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Used when the caller does not pick a model.
pub const DEFAULT_MODEL_ID: &str = "local:phi4mini";

/// One provider round trip: prompts in, parsed but unvalidated JSON out.
pub struct GenerationOrchestrator {
    registry: Arc<ProviderRegistry>,
}

impl GenerationOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn requested_model(request: &GenerationRequest) -> &str {
        request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(DEFAULT_MODEL_ID)
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<LlmResult> {
        let (client, model_id) = self.registry.resolve(Self::requested_model(request))?;

        let schema = ir_schema();
        let user_prompt = build_user_prompt(request, schema);
        let system_prompt = build_system_prompt(&request.custom_system_prompt);

        info!(
            model = %model_id,
            suite = %request.suite_name,
            "Requesting test design"
        );
        let response = client
            .generate(&model_id.model, &system_prompt, &user_prompt, schema)
            .await?;

        let json_text = extract_json_payload(&response.response_text);
        let ir_json: Value =
            serde_json::from_str(&json_text).map_err(|e| AppError::InvalidLlmOutput {
                raw_text: response.response_text.clone(),
                parse_error: e.to_string(),
            })?;

        Ok(LlmResult {
            ir_json,
            request_payload: response.request_payload,
            response_raw: response.response_text,
            model_name: model_id.to_string(),
        })
    }

    /// `generate` with one retry on a retryable failure.
    pub async fn generate_with_retry(&self, request: &GenerationRequest) -> Result<LlmResult> {
        with_single_retry("Test design generation", || self.generate(request)).await
    }
}
