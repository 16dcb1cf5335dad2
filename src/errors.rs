use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Main error type for the nearby-fanout service
#[derive(Debug)]
pub enum NotifyError {
    // HTTP and API errors
    BadRequest(String),
    InternalServer(String),

    // User store errors
    StoreRead(String),
    InvalidStoreUrl(String),

    // Push provider errors
    FcmDelivery(String),
    ProviderUnavailable(String),

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),

    // Configuration and setup errors
    MissingEnvironmentVariable(String),
    InvalidConfiguration(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            NotifyError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            NotifyError::StoreRead(msg) => write!(f, "User store read failed: {}", msg),
            NotifyError::InvalidStoreUrl(msg) => write!(f, "Invalid user store URL: {}", msg),

            NotifyError::FcmDelivery(msg) => write!(f, "FCM delivery error: {}", msg),
            NotifyError::ProviderUnavailable(msg) => write!(f, "Push provider unavailable: {}", msg),

            NotifyError::NetworkTimeout => write!(f, "Network request timed out"),
            NotifyError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            NotifyError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            NotifyError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            NotifyError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),

            NotifyError::MissingEnvironmentVariable(var) => {
                write!(f, "Missing environment variable: {}", var)
            }
            NotifyError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for NotifyError {}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            NotifyError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            NotifyError::StoreRead(_) => (StatusCode::BAD_GATEWAY, "store_read_failed"),
            NotifyError::ProviderUnavailable(_) | NotifyError::FcmDelivery(_) => {
                (StatusCode::BAD_GATEWAY, "provider_unavailable")
            }
            NotifyError::NetworkTimeout => (StatusCode::GATEWAY_TIMEOUT, "network_timeout"),

            // All other errors are treated as internal server errors
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type NotifyResult<T> = Result<T, NotifyError>;

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::NetworkTimeout
        } else if err.is_connect() {
            NotifyError::NetworkConnection(err.to_string())
        } else {
            NotifyError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            NotifyError::JsonParsing(err.to_string())
        } else {
            NotifyError::JsonSerialization(err.to_string())
        }
    }
}

// Helper functions for creating common errors
impl NotifyError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        NotifyError::BadRequest(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        NotifyError::InternalServer(msg.into())
    }

    pub fn store_read(msg: impl Into<String>) -> Self {
        NotifyError::StoreRead(msg.into())
    }

    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        NotifyError::ProviderUnavailable(msg.into())
    }
}
