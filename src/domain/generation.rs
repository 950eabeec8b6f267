use crate::domain::design_ir::CoverageLevel;
use crate::domain::profile::Profile;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MAX_TECHNIQUES: usize = 50;
pub const MAX_TECHNIQUE_LEN: usize = 200;

/// Body of a design generation call.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(deny_unknown_fields)]
pub struct DesignRequest {
    #[validate(range(min = 1))]
    pub profile_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub suite_name: String,
    pub coverage_level: CoverageLevel,
    #[validate(length(min = 1, max = 20000))]
    pub element_steps_text: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub spec_text: String,
    #[serde(default)]
    #[validate(length(max = 300))]
    pub model: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_techniques"))]
    pub test_techniques: Vec<String>,
}

impl DesignRequest {
    pub fn normalized(mut self) -> Self {
        self.suite_name = self.suite_name.trim().to_string();
        self.element_steps_text = self.element_steps_text.trim().to_string();
        self.model = self
            .model
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self.test_techniques = self
            .test_techniques
            .into_iter()
            .map(|value| value.trim().to_string())
            .collect();
        self
    }
}

/// Everything the orchestrator needs for one generation. Built per call and
/// never stored.
#[derive(Debug, Clone, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1, max = 200))]
    pub suite_name: String,
    pub coverage_level: CoverageLevel,
    #[validate(length(min = 1, max = 20000))]
    pub element_steps_text: String,
    #[validate(length(max = 20000))]
    pub spec_text: String,
    pub model: Option<String>,
    #[validate(custom(function = "validate_techniques"))]
    pub test_techniques: Vec<String>,
    #[validate(length(max = 20000))]
    pub terminology_text: String,
    #[validate(length(max = 20000))]
    pub style_text: String,
    #[validate(length(max = 20000))]
    pub custom_system_prompt: String,
    /// Rendered coverage rule injected into the user prompt.
    pub rules_text: String,
}

impl GenerationRequest {
    pub fn from_design(request: &DesignRequest, profile: &Profile, rules_text: String) -> Self {
        Self {
            suite_name: request.suite_name.clone(),
            coverage_level: request.coverage_level,
            element_steps_text: request.element_steps_text.clone(),
            spec_text: request.spec_text.clone(),
            model: request.model.clone(),
            test_techniques: request.test_techniques.clone(),
            terminology_text: profile.terminology_text.clone(),
            style_text: profile.style_text.clone(),
            custom_system_prompt: profile.custom_system_prompt.clone(),
            rules_text,
        }
    }
}

/// Raw outcome of a single provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub response_text: String,
    /// Exact body sent upstream, kept for the audit trail.
    pub request_payload: serde_json::Value,
}

/// Parsed but not yet shape-checked generation output.
#[derive(Debug, Clone)]
pub struct LlmResult {
    pub ir_json: serde_json::Value,
    pub request_payload: serde_json::Value,
    pub response_raw: String,
    /// `provider:model`
    pub model_name: String,
}

fn validate_techniques(values: &Vec<String>) -> Result<(), ValidationError> {
    if values.len() > MAX_TECHNIQUES {
        return Err(ValidationError::new("too_many_techniques"));
    }
    let bad_item = values.iter().any(|value| {
        let len = value.trim().chars().count();
        len == 0 || len > MAX_TECHNIQUE_LEN
    });
    if bad_item {
        return Err(ValidationError::new("technique_length"));
    }
    Ok(())
}
