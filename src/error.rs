//! Error types for the anSpace client

use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// Language used for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    /// Parse a locale tag such as `en`, `ru` or `ru-RU`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag.split(['-', '_']).next()?.to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(Self::En),
            "ru" => Some(Self::Ru),
            _ => None,
        }
    }
}

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// A protected call was attempted with no stored access token
    #[error("empty accessToken")]
    MissingToken,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Request error: {message}")]
    Request { status: StatusCode, message: String },

    /// The server rejected the bearer token as expired
    #[error("Request error: {message}")]
    TokenExpired { message: String },

    #[error("Service error: {0}")]
    Service(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token refresh failed; the underlying error is shared between all
    /// callers that waited on the same refresh
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Arc<ClientError>),
}

impl ClientError {
    pub fn is_token_expired(&self) -> bool {
        matches!(self, Self::TokenExpired { .. })
    }

    /// HTTP status carried by the error, if the server produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::TokenExpired { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Human readable message in the requested language
    pub fn localized(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.to_string(),
            Locale::Ru => match self {
                Self::MissingToken => "Отсутствует токен доступа".to_string(),
                Self::Network(e) => format!("Сетевая ошибка: {e}"),
                Self::Request { message, .. } | Self::TokenExpired { message } => {
                    format!("Ошибка запроса: {message}")
                }
                Self::Service(msg) => format!("Ошибка сервиса: {msg}"),
                Self::Unexpected(msg) => format!("Неизвестная ошибка: {msg}"),
                Self::Serialization(e) => format!("Ошибка сериализации: {e}"),
                Self::Storage(msg) => format!("Ошибка хранилища: {msg}"),
                Self::Configuration(msg) => format!("Ошибка конфигурации: {msg}"),
                Self::RefreshFailed(inner) => inner.localized(locale),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("ru-RU"), Some(Locale::Ru));
        assert_eq!(Locale::from_tag("EN"), Some(Locale::En));
        assert_eq!(Locale::from_tag("de"), None);
    }

    #[test]
    fn test_request_error_embeds_server_message() {
        let err = ClientError::Request {
            status: StatusCode::BAD_REQUEST,
            message: "incorrect email".to_string(),
        };

        assert_eq!(err.to_string(), "Request error: incorrect email");
        assert_eq!(err.localized(Locale::Ru), "Ошибка запроса: incorrect email");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(!err.is_token_expired());
    }

    #[test]
    fn test_refresh_failure_keeps_inner_status() {
        let inner = ClientError::Request {
            status: StatusCode::UNAUTHORIZED,
            message: "http: named cookie not present".to_string(),
        };
        let err = ClientError::RefreshFailed(Arc::new(inner));

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(
            err.localized(Locale::Ru),
            "Ошибка запроса: http: named cookie not present"
        );
    }

    #[test]
    fn test_missing_token_message() {
        assert_eq!(ClientError::MissingToken.to_string(), "empty accessToken");
    }
}
