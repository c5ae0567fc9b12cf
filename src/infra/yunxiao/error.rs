//! Yunxiao API error types.

use serde_json::Value;
use thiserror::Error;

use crate::shared::json::first_str;

#[derive(Error, Debug)]
pub enum YunxiaoError {
    #[error("Missing API token: set ${0} or api.token_env in the config file")]
    MissingToken(String),

    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    #[error("Yunxiao API error: {message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = anyhow::Result<T>;

/// Extract a readable message from an error response body.
///
/// Yunxiao returns `{"errorCode": ..., "errorMessage": ...}` on most
/// endpoints, but some gateways answer with `message` or plain text.
pub fn format_error_body(body: &str) -> String {
    let body = body.trim();
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return if body.is_empty() {
            "empty response body".to_string()
        } else {
            body.to_string()
        };
    };

    let message = first_str(&value, &["errorMessage", "message", "errorMsg", "error"]);
    let code = first_str(&value, &["errorCode", "code"]);
    match (message, code) {
        (Some(m), Some(c)) => format!("{m} [{c}]"),
        (Some(m), None) => m,
        (None, Some(c)) => c,
        (None, None) => body.to_string(),
    }
}
