pub mod anthropic;
pub mod gemini;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod schema;

use crate::domain::error::{AppError, Result};
use crate::domain::generation::ProviderResponse;
use crate::domain::llm_config::{LLMProvider, ModelInfo};
use crate::domain::model_id::ModelId;
use crate::infrastructure::config::{AppConfig, LlmSettingsStore};
use anthropic::AnthropicClient;
use async_trait::async_trait;
use gemini::GeminiClient;
use ollama::OllamaClient;
use openai::OpenAIClient;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub const GENERATION_TEMPERATURE: f64 = 0.2;

#[async_trait]
pub trait LLMClient: Send + Sync {
    fn provider(&self) -> LLMProvider;

    /// Whether the required credential is present. Reachability is not checked.
    fn is_available(&self) -> bool;

    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// One HTTP call. `model` is the bare name without the provider prefix.
    async fn generate(
        &self,
        model: &str,
        system: &str,
        user: &str,
        schema: &Value,
    ) -> Result<ProviderResponse>;
}

/// Fixed set of provider clients, looked up by tag.
pub struct ProviderRegistry {
    clients: Vec<Arc<dyn LLMClient>>,
}

impl ProviderRegistry {
    pub fn new(config: &AppConfig, settings: Arc<LlmSettingsStore>) -> Self {
        let timeout = config.request_timeout();
        Self::with_clients(vec![
            Arc::new(OllamaClient::new(&config.ollama_base_url, timeout)),
            Arc::new(OpenAIClient::new(settings.clone(), timeout)),
            Arc::new(AnthropicClient::new(
                &config.anthropic_base_url,
                settings.clone(),
                timeout,
            )),
            Arc::new(GeminiClient::new(&config.gemini_base_url, settings, timeout)),
        ])
    }

    pub fn with_clients(clients: Vec<Arc<dyn LLMClient>>) -> Self {
        Self { clients }
    }

    /// Parses a model identifier and returns the configured client for it.
    pub fn resolve(&self, raw_model_id: &str) -> Result<(Arc<dyn LLMClient>, ModelId)> {
        let model_id = ModelId::parse(raw_model_id)?;
        let client = self
            .clients
            .iter()
            .find(|client| client.provider() == model_id.provider)
            .cloned()
            .ok_or_else(|| AppError::UnknownProvider(model_id.provider.tag().to_string()))?;

        if !client.is_available() {
            return Err(AppError::ProviderNotConfigured(
                model_id.provider.tag().to_string(),
            ));
        }
        Ok((client, model_id))
    }

    /// Queries every available provider concurrently. A failing provider is
    /// logged and skipped; results arrive in completion order.
    pub async fn list_all_models(&self) -> Result<Vec<ModelInfo>> {
        let mut tasks = JoinSet::new();
        for client in self.clients.iter().filter(|client| client.is_available()) {
            let client = Arc::clone(client);
            tasks.spawn(async move {
                let provider = client.provider();
                (provider, client.list_models().await)
            });
        }

        let mut models = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (provider, result) = joined
                .map_err(|e| AppError::Internal(format!("Model listing task failed: {}", e)))?;
            match result {
                Ok(found) => {
                    debug!("{} listed {} models", provider.label(), found.len());
                    models.extend(found);
                }
                Err(e) => warn!("Failed to list models from {}: {}", provider.label(), e),
            }
        }
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedClient {
        provider: LLMProvider,
        available: bool,
        models: std::result::Result<Vec<&'static str>, u16>,
        delay_ms: u64,
    }

    #[async_trait]
    impl LLMClient for FixedClient {
        fn provider(&self) -> LLMProvider {
            self.provider
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            match &self.models {
                Ok(names) => Ok(names
                    .iter()
                    .map(|name| ModelInfo::new(self.provider, name, name))
                    .collect()),
                Err(status) => Err(AppError::ProviderListError {
                    provider: self.provider.label().to_string(),
                    status: *status,
                    body: "down".to_string(),
                }),
            }
        }

        async fn generate(
            &self,
            _model: &str,
            _system: &str,
            _user: &str,
            _schema: &Value,
        ) -> Result<ProviderResponse> {
            Ok(ProviderResponse {
                response_text: "{}".to_string(),
                request_payload: Value::Null,
            })
        }
    }

    fn client(
        provider: LLMProvider,
        available: bool,
        models: std::result::Result<Vec<&'static str>, u16>,
        delay_ms: u64,
    ) -> Arc<dyn LLMClient> {
        Arc::new(FixedClient {
            provider,
            available,
            models,
            delay_ms,
        })
    }

    #[test]
    fn test_resolve_defaults_to_local() {
        let registry = ProviderRegistry::with_clients(vec![client(
            LLMProvider::Local,
            true,
            Ok(vec![]),
            0,
        )]);
        let (resolved, model_id) = registry.resolve("phi4mini").unwrap();
        assert_eq!(resolved.provider(), LLMProvider::Local);
        assert_eq!(model_id.model, "phi4mini");
    }

    #[test]
    fn test_resolve_rejects_unconfigured_provider() {
        let registry = ProviderRegistry::with_clients(vec![
            client(LLMProvider::Local, true, Ok(vec![]), 0),
            client(LLMProvider::OpenAI, false, Ok(vec![]), 0),
        ]);
        match registry.resolve("openai:gpt-4o") {
            Err(AppError::ProviderNotConfigured(tag)) => assert_eq!(tag, "openai"),
            other => panic!("unexpected: {:?}", other.map(|(_, id)| id)),
        }
        assert!(matches!(
            registry.resolve("mystery:model"),
            Err(AppError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_resolve_missing_client_is_unknown_provider() {
        let registry = ProviderRegistry::with_clients(vec![]);
        assert!(matches!(
            registry.resolve("gemini:gemini-2.0-flash"),
            Err(AppError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_models_swallows_provider_failures() {
        let registry = ProviderRegistry::with_clients(vec![
            client(LLMProvider::Local, true, Ok(vec!["phi4mini"]), 0),
            client(LLMProvider::OpenAI, true, Err(503), 0),
            client(LLMProvider::Anthropic, false, Ok(vec!["claude-x"]), 0),
            client(LLMProvider::Gemini, true, Ok(vec!["gemini-2.0-flash"]), 0),
        ]);
        let mut ids: Vec<String> = registry
            .list_all_models()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["gemini:gemini-2.0-flash", "local:phi4mini"]);
    }

    #[tokio::test]
    async fn test_list_all_models_in_completion_order() {
        let registry = ProviderRegistry::with_clients(vec![
            client(LLMProvider::Local, true, Ok(vec!["slow"]), 150),
            client(LLMProvider::Gemini, true, Ok(vec!["fast"]), 0),
        ]);
        let models = registry.list_all_models().await.unwrap();
        assert_eq!(models[0].id, "gemini:fast");
        assert_eq!(models[1].id, "local:slow");
    }
}
