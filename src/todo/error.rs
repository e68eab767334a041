use reqwest::StatusCode;
use thiserror::Error;

use super::api_types::ApiErrorBody;

/// Failure at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request never reached the server or no response came back
  #[error("Request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("Request to {url} timed out")]
  Timeout { url: String },

  /// The server answered with a non-2xx status
  #[error("Server returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("Failed to decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Invalid API base URL {0}")]
  InvalidBaseUrl(String),

  #[error("Failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
  /// Build a status error, taking the message from a structured body when present.
  pub fn from_status(status: u16, body: &str) -> Self {
    let message = serde_json::from_str::<ApiErrorBody>(body)
      .ok()
      .and_then(|b| b.message)
      .or_else(|| {
        StatusCode::from_u16(status)
          .ok()
          .and_then(|s| s.canonical_reason())
          .map(String::from)
      })
      .unwrap_or_else(|| "An error occurred".to_string());

    ApiError::Status { status, message }
  }

  /// Short text for user-facing notifications.
  pub fn user_message(&self) -> String {
    match self {
      ApiError::Status { message, .. } => message.clone(),
      ApiError::Timeout { .. } => "The server did not respond in time".to_string(),
      ApiError::Transport { .. } => "Could not reach the server".to_string(),
      other => other.to_string(),
    }
  }
}
