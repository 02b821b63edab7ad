//! Classification of transport failures into [`ClientError`]

use crate::error::ClientError;
use crate::types::ErrorResponse;
use reqwest::StatusCode;
use tracing::error;

/// Server message that marks an expired access token
const TOKEN_EXPIRED_MARKER: &str = "Token is expired";

/// Raw failure observed by the HTTP wrapper, before classification
#[derive(Debug)]
pub enum ApiFailure {
    /// reqwest failed before or while talking to the server
    Transport(reqwest::Error),
    /// The server answered with a non-success status
    Status { status: StatusCode, body: String },
    /// The server answered successfully but the body was unusable
    Service(String),
    Unexpected(String),
}

/// Map a failure onto the client error taxonomy
pub fn normalize(failure: ApiFailure) -> ClientError {
    match failure {
        ApiFailure::Transport(e) => normalize_transport(e),
        ApiFailure::Status { status, body } => normalize_status(status, &body),
        ApiFailure::Service(msg) => {
            error!(error = %msg, "Service error");
            ClientError::Service(msg)
        }
        ApiFailure::Unexpected(msg) => {
            error!(error = %msg, "Unexpected error");
            ClientError::Unexpected(msg)
        }
    }
}

fn normalize_transport(e: reqwest::Error) -> ClientError {
    if let Some(status) = e.status() {
        return normalize_status(status, "");
    }

    if e.is_connect() || e.is_timeout() || e.is_request() {
        error!(error = %e, "Network error");
        ClientError::Network(e)
    } else if e.is_body() || e.is_decode() {
        error!(error = %e, "Service error");
        ClientError::Service(e.to_string())
    } else {
        error!(error = %e, "Unexpected error");
        ClientError::Unexpected(e.to_string())
    }
}

fn normalize_status(status: StatusCode, body: &str) -> ClientError {
    let message = server_message(status, body);

    if status == StatusCode::NOT_FOUND {
        error!(error = %message, "Not found");
    }

    error!(error = %message, status = %status, "Request error");

    if status == StatusCode::UNAUTHORIZED && message.contains(TOKEN_EXPIRED_MARKER) {
        return ClientError::TokenExpired { message };
    }

    ClientError::Request { status, message }
}

/// Pull the `{message}` field out of an error body, falling back to the raw
/// text and then to the status reason
fn server_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.message;
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}
