//! Error types for the vision client.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error body returned by the API for non-success responses.
#[derive(Error, Debug, Clone, PartialEq, Eq, Deserialize)]
#[error("API error: {status_code} - {message}")]
pub struct ApiError {
    pub status_code: u16,
    pub message: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    status_code: Option<u16>,
    message: Option<String>,
}

impl ApiError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    /// Build an error from a failed response.
    ///
    /// JSON bodies fill in whichever of `status_code` / `message` they carry;
    /// anything else becomes the message verbatim.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(body).into_owned();
        match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(parsed) => Self {
                status_code: parsed.status_code.unwrap_or(status),
                message: parsed.message.unwrap_or(raw),
            },
            Err(_) => Self::new(status, raw),
        }
    }
}

/// Vision client errors.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Failed to read image file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize request: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// `status` is the HTTP status of the response and decides retries;
    /// `error` is what the server reported in the body.
    #[error("{error}")]
    Api { status: u16, error: ApiError },
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Request cancelled")]
    Cancelled,
    #[error("Max retries exceeded after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<VisionError>,
    },
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl VisionError {
    /// Build an API error from a failed response.
    pub fn api(status: u16, body: &[u8]) -> Self {
        VisionError::Api {
            status,
            error: ApiError::from_response(status, body),
        }
    }

    /// Network failures, server errors (HTTP 5xx) and undecodable success
    /// bodies may succeed on another attempt. Everything else, including
    /// requests reqwest could not even build, is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            VisionError::Network(e) => !e.is_builder(),
            VisionError::Decode(_) => true,
            VisionError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status of the failed response behind this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            VisionError::Api { status, .. } => Some(*status),
            VisionError::RetriesExhausted { source, .. } => source.http_status(),
            _ => None,
        }
    }

    /// Whether this is (or wraps) a per-attempt timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            VisionError::Network(e) => e.is_timeout(),
            VisionError::RetriesExhausted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// The API error behind this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            VisionError::Api { error, .. } => Some(error),
            VisionError::RetriesExhausted { source, .. } => source.api_error(),
            _ => None,
        }
    }
}
