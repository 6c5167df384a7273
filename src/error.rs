//! Error handling

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info};

/// definitions for the mandalabrew application.
#[derive(Debug)]
pub enum MandalaError {
    /// Rejected user input, caught before any external call
    Validation(String),
    /// The image service rejected the supplied credential
    Auth(String),
    /// The image service reported a rate or quota limit
    Quota(String),
    /// Network failure, non-2xx response, or malformed response body
    Transport(String),
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    Internal(String),
}

impl std::fmt::Display for MandalaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::Auth(message) => write!(f, "Authentication failed: {message}"),
            Self::Quota(message) => write!(f, "Quota exceeded: {message}"),
            Self::Transport(message) => write!(f, "Image service error: {message}"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::Internal(message) => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for MandalaError {}

impl From<axum::http::Error> for MandalaError {
    fn from(err: axum::http::Error) -> Self {
        MandalaError::Internal(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for MandalaError {
    fn from(err: tower_sessions::session::Error) -> Self {
        MandalaError::Internal(err.to_string())
    }
}

impl IntoResponse for MandalaError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            MandalaError::Validation(message) => {
                info!("Rejected input: {message}");
                StatusCode::BAD_REQUEST
            }
            MandalaError::Auth(message) => {
                info!("Upstream auth failure: {message}");
                StatusCode::UNAUTHORIZED
            }
            MandalaError::Quota(message) => {
                info!("Upstream quota limit: {message}");
                StatusCode::TOO_MANY_REQUESTS
            }
            MandalaError::Transport(message) => {
                error!("Image service error: {message}");
                StatusCode::BAD_GATEWAY
            }
            MandalaError::NotFound(url) => {
                error!("404 {url}");
                StatusCode::NOT_FOUND
            }
            MandalaError::Internal(message) => {
                error!("Internal server error: {message}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = match &self {
            MandalaError::NotFound(_) => "Not Found".to_string(),
            MandalaError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        let mut response = axum::response::Response::new(axum::body::Body::from(body));
        *response.status_mut() = status;
        response
    }
}
