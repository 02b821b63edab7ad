//! Wire types for the auth API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Email and password submitted to signin or signup
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthCredentials {
    pub email: String,
    pub password: String,
}

impl AuthCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Currently signed-in user as reported by `/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

/// Error body returned by the server on failure
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordResetRequest<'a> {
    pub email: &'a str,
}

/// Success body, either wrapped in `{"data": ...}` or bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(data) => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_accepts_wrapped_and_bare() {
        let wrapped: Envelope<AccessTokenResponse> =
            serde_json::from_str(r#"{"data":{"accessToken":"tok1"}}"#).unwrap();
        assert_eq!(wrapped.into_inner().access_token, "tok1");

        let bare: Envelope<AccessTokenResponse> =
            serde_json::from_str(r#"{"accessToken":"tok2"}"#).unwrap();
        assert_eq!(bare.into_inner().access_token, "tok2");
    }

    #[test]
    fn test_user_uses_camel_case() {
        let body = r#"{"user":{"email":"a@b.com","username":"neo","passwordHash":"h"}}"#;
        let resp: UserResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.user.password_hash, "h");
        assert_eq!(resp.user.username, "neo");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = AuthCredentials::new("a@b.com", "123456789012");
        let out = format!("{creds:?}");
        assert!(out.contains("a@b.com"));
        assert!(!out.contains("123456789012"));
    }
}
