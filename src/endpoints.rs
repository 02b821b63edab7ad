//! Auth endpoints of the anSpace API

use crate::api_client::{ApiClient, ApiRequest};
use crate::error::Result;
use crate::types::{AccessTokenResponse, AuthCredentials, PasswordResetRequest, User, UserResponse};
use std::sync::Arc;
use tracing::info;

const SIGNUP_PATH: &str = "/auth/signup";
const SIGNIN_PATH: &str = "/auth/signin";
const ME_PATH: &str = "/auth/me";
const LOGOUT_PATH: &str = "/auth/logout";
const PASSWORD_RESET_PATH: &str = "/auth/genpassresetcode";

/// Typed wrappers around the `/auth` routes
#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Create an account and keep the returned access token
    pub async fn signup(&self, credentials: &AuthCredentials) -> Result<()> {
        let response: AccessTokenResponse =
            self.client.post(SIGNUP_PATH, credentials, false).await?;
        self.client.token_store().store(&response.access_token)?;

        info!(email = %credentials.email, "Signed up");
        Ok(())
    }

    /// Sign in and keep the returned access token
    pub async fn signin(&self, credentials: &AuthCredentials) -> Result<()> {
        let response: AccessTokenResponse =
            self.client.post(SIGNIN_PATH, credentials, false).await?;
        self.client.token_store().store(&response.access_token)?;

        info!(email = %credentials.email, "Signed in");
        Ok(())
    }

    /// Exchange the current token for a fresh one
    pub async fn refresh(&self) -> Result<()> {
        self.client.refresh().await?;
        Ok(())
    }

    /// Fetch the user the stored access token belongs to
    pub async fn who_am_i(&self) -> Result<User> {
        let response: UserResponse = self.client.get(ME_PATH, true).await?;
        Ok(response.user)
    }

    /// Revoke the refresh cookie on the server and forget the access token
    pub async fn logout(&self) -> Result<()> {
        let request = ApiRequest::get(LOGOUT_PATH);
        let result = self.client.call_unit(&request).await;

        // The local session ends even if the server call failed
        self.client.token_store().clear()?;
        result?;

        info!("Logged out");
        Ok(())
    }

    /// Ask the server to email a password reset code
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let request = ApiRequest::post(PASSWORD_RESET_PATH).json(&PasswordResetRequest { email })?;
        self.client.call_unit(&request).await
    }
}
