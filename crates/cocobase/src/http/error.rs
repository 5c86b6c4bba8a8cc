/*
[INPUT]:  Error sources (HTTP, API status, serialization, storage, WebSocket)
[OUTPUT]: Structured error types with request context and suggestions
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Main error type for the Cocobase SDK
#[derive(Error, Debug)]
pub enum CocobaseError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a status >= 400
    #[error(
        "API request failed: {method} {url} (status: {status})\nBody: {body}\nSuggestion: {suggestion}"
    )]
    Api {
        status: u16,
        method: String,
        url: String,
        body: String,
        suggestion: String,
    },

    /// Operation needs a bearer token but none is held
    #[error("user is not authenticated")]
    NotAuthenticated,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Session storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CocobaseError {
    /// Build an API error for a failed response
    pub fn api_error(
        status: StatusCode,
        method: &Method,
        url: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        CocobaseError::Api {
            status: status.as_u16(),
            method: method.to_string(),
            url: url.into(),
            body: body.into(),
            suggestion: error_suggestion(status, method),
        }
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            CocobaseError::Api { status, .. } => Some(*status),
            CocobaseError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            CocobaseError::Http(_) | CocobaseError::WebSocket(_) => true,
            CocobaseError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            CocobaseError::NotAuthenticated => true,
            CocobaseError::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CocobaseError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CocobaseError::WebSocket(e.to_string())
    }
}

/// Human hint attached to API errors
pub fn error_suggestion(status: StatusCode, method: &Method) -> String {
    match status.as_u16() {
        401 => "Check if your API key is valid and properly set".to_string(),
        403 => {
            "You don't have permission to perform this action. Verify your access rights"
                .to_string()
        }
        404 => {
            "The requested resource was not found. Verify the path and ID are correct".to_string()
        }
        405 => format!(
            "The {method} method is not allowed for this endpoint. Check the API documentation for supported methods"
        ),
        429 => "You've exceeded the rate limit. Please wait before making more requests".to_string(),
        _ => "Check the API documentation and verify your request format".to_string(),
    }
}

/// Result type alias for Cocobase operations
pub type Result<T> = std::result::Result<T, CocobaseError>;
