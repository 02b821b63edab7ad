//! Session state exposed to the presentation layer

use crate::endpoints::AuthApi;
use crate::error::{ClientError, Locale, Result};
use crate::token_store::TokenStore;
use crate::types::User;
use tracing::{debug, warn};

/// Route unauthenticated visitors are sent to
pub const AUTH_ROUTE: &str = "/";

/// Outcome of the navigation guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(&'static str),
}

/// Decide whether navigation to a route may continue
pub fn guard(requires_auth: bool, token_store: &TokenStore) -> Result<Navigation> {
    if requires_auth && !token_store.is_authenticated()? {
        debug!(redirect = AUTH_ROUTE, "Route requires auth, no access token stored");
        return Ok(Navigation::Redirect(AUTH_ROUTE));
    }
    Ok(Navigation::Proceed)
}

/// Current user plus the error of the last lookup
#[derive(Debug, Default)]
pub struct SessionStore {
    user: Option<User>,
    who_am_i_error: Option<ClientError>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn who_am_i_error(&self) -> Option<&ClientError> {
        self.who_am_i_error.as_ref()
    }

    /// Localized text of the last lookup error
    pub fn error_message(&self, locale: Locale) -> Option<String> {
        self.who_am_i_error.as_ref().map(|e| e.localized(locale))
    }

    /// Look up the current user. A failure clears the user and is kept for
    /// the UI instead of being returned.
    pub async fn who_am_i(&mut self, api: &AuthApi) {
        match api.who_am_i().await {
            Ok(user) => {
                debug!(username = %user.username, "Session user loaded");
                self.user = Some(user);
                self.who_am_i_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load session user");
                self.user = None;
                self.who_am_i_error = Some(e);
            }
        }
    }

    /// Localized text of the last lookup error, in the client's locale
    pub fn localized_error(&self, api: &AuthApi) -> Option<String> {
        self.who_am_i_error
            .as_ref()
            .map(|e| api.client().localize(e))
    }

    pub fn clear(&mut self) {
        self.user = None;
        self.who_am_i_error = None;
    }
}
