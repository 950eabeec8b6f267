use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(JobStatus::Success),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }
}

/// Audit record of one generation attempt, written on success and failure.
/// Its id doubles as the design id that versions hang off.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DesignJob {
    pub id: String,
    pub profile_id: Option<i64>,
    pub suite_name: String,
    pub coverage_level: String,
    pub element_steps_text: String,
    pub spec_text: String,
    pub rules_snapshot_text: String,
    pub status: JobStatus,
    pub llm_model_name: Option<String>,
    pub llm_request_json: Option<String>,
    pub llm_response_json: Option<String>,
    pub error_message: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EditedBy {
    Model,
    User,
}

impl EditedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditedBy::Model => "model",
            EditedBy::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "model" => Some(EditedBy::Model),
            "user" => Some(EditedBy::User),
            _ => None,
        }
    }
}

impl fmt::Display for EditedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable snapshot in a design's version chain.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IrVersion {
    pub id: String,
    pub design_id: String,
    pub version_no: i64,
    pub ir_json: String,
    pub edited_by: EditedBy,
    pub created_at: i64,
}
