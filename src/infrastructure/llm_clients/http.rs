use crate::domain::error::{AppError, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const FAILED_ERROR_BODY: &str = "<failed to read error body>";

/// Sends `request` with its own timeout. Expiry surfaces as
/// `ProviderTimeout`, distinct from transport failures and non-2xx replies.
pub async fn send_with_timeout(
    request: RequestBuilder,
    timeout: Duration,
    label: &str,
) -> Result<Response> {
    request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| request_error(e, timeout, label))
}

/// Decodes a 2xx body. The request timeout also bounds the body read.
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
    timeout: Duration,
    label: &str,
) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            request_error(e, timeout, label)
        } else {
            AppError::LLMError(format!("{}: failed to parse JSON: {}", label, e))
        }
    })
}

pub async fn read_error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| FAILED_ERROR_BODY.to_string())
}

fn request_error(e: reqwest::Error, timeout: Duration, label: &str) -> AppError {
    if e.is_timeout() {
        AppError::ProviderTimeout {
            label: label.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        AppError::LLMError(format!("{}: {}", label, e))
    }
}

pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
