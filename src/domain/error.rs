use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    LLMError(String),
    DatabaseError(String),
    IoError(String),

    InvalidIdentifier(String),
    UnknownProvider(String),
    InvalidModelName(String),
    ProviderNotConfigured(String),
    ProviderTimeout {
        label: String,
        timeout_ms: u64,
    },
    ProviderListError {
        provider: String,
        status: u16,
        body: String,
    },
    ProviderGenerateError {
        provider: String,
        status: u16,
        body: String,
    },
    InvalidLlmOutput {
        raw_text: String,
        parse_error: String,
    },
    SchemaViolation(String),
    DesignNotFound(String),
}

/// Coarse classification used by callers to decide between retrying,
/// reconfiguring credentials, or reporting a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadInput,
    NotFound,
    NotConfigured,
    UpstreamUnavailable,
    UpstreamGarbage,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidIdentifier(_)
            | AppError::UnknownProvider(_)
            | AppError::InvalidModelName(_) => ErrorKind::BadInput,
            AppError::NotFound(_) | AppError::DesignNotFound(_) => ErrorKind::NotFound,
            AppError::ProviderNotConfigured(_) => ErrorKind::NotConfigured,
            AppError::LLMError(_)
            | AppError::ProviderTimeout { .. }
            | AppError::ProviderListError { .. }
            | AppError::ProviderGenerateError { .. } => ErrorKind::UpstreamUnavailable,
            AppError::InvalidLlmOutput { .. } | AppError::SchemaViolation(_) => {
                ErrorKind::UpstreamGarbage
            }
            AppError::Internal(_) | AppError::DatabaseError(_) | AppError::IoError(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Malformed model selection and missing credentials fail the same way on
    /// every attempt, so they are surfaced without a second call.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::ValidationError(_)
                | AppError::InvalidIdentifier(_)
                | AppError::UnknownProvider(_)
                | AppError::InvalidModelName(_)
                | AppError::ProviderNotConfigured(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::InvalidIdentifier(msg) => write!(f, "Invalid model identifier: {}", msg),
            AppError::UnknownProvider(provider) => {
                write!(f, "Unknown LLM provider: {}", provider)
            }
            AppError::InvalidModelName(msg) => write!(f, "Invalid model name: {}", msg),
            AppError::ProviderNotConfigured(provider) => write!(
                f,
                "Provider \"{}\" is not configured. Set the required API key.",
                provider
            ),
            AppError::ProviderTimeout { label, timeout_ms } => {
                write!(f, "{}: request timeout ({}ms)", label, timeout_ms)
            }
            AppError::ProviderListError {
                provider,
                status,
                body,
            } => write!(f, "{} list models error {}: {}", provider, status, body),
            AppError::ProviderGenerateError {
                provider,
                status,
                body,
            } => write!(f, "{} API error {}: {}", provider, status, body),
            AppError::InvalidLlmOutput { parse_error, .. } => {
                write!(f, "LLM returned invalid JSON: {}", parse_error)
            }
            AppError::SchemaViolation(details) => {
                write!(f, "LLM response validation failed: {}", details)
            }
            AppError::DesignNotFound(id) => write!(f, "Design not found: {}", id),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
