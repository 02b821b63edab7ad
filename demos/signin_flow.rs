//! Sign in and look up the current user
//!
//! Usage:
//!   BACKEND_URL=http://localhost:8000 EMAIL=a@b.com PASSWORD=123456789012 \
//!     cargo run --example signin_flow

use anspace_client::{
    ApiClient, AuthApi, AuthForm, ClientConfig, FileStorage, FormValidator, SessionStore,
    TokenStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let locale = config.locale;
    let email = std::env::var("EMAIL").unwrap_or_default();
    let password = std::env::var("PASSWORD").unwrap_or_default();
    let state_path =
        std::env::var("CLIENT_STATE").unwrap_or_else(|_| "anspace-client.json".to_string());

    println!("=== anSpace Client Example ===");
    println!("Backend: {}", config.base_url());
    println!("State file: {}", state_path);
    println!();

    // Validate the form the same way the signin page does
    let mut validator = FormValidator::new();
    let form = AuthForm::from_fields([("email", email), ("password", password)]);
    let Some(credentials) = validator.validate(&form) else {
        let errors = validator.errors();
        for (field, error) in [
            ("email", errors.email),
            ("password", errors.password),
            ("repeatPassword", errors.repeat_password),
        ] {
            if let Some(error) = error {
                println!("! {}: {}", field, error.localized(locale));
            }
        }
        return Ok(());
    };

    let tokens = TokenStore::new(Arc::new(FileStorage::new(state_path)));
    let client = ApiClient::new(config, tokens)?;
    let api = AuthApi::new(client);

    println!("Signing in as {}...", credentials.email);
    if let Err(e) = api.signin(&credentials).await {
        println!("! {}", api.client().localize(&e));
        return Ok(());
    }
    println!("✓ Signed in, access token stored");
    println!();

    // The lookup refreshes the token on its own if it has expired
    let mut session = SessionStore::new();
    session.who_am_i(&api).await;
    match session.user() {
        Some(user) => println!("✓ Signed in user: {} <{}>", user.username, user.email),
        None => {
            if let Some(message) = session.localized_error(&api) {
                println!("! {}", message);
            }
        }
    }

    Ok(())
}
