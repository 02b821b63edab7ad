//! anSpace Rust Client
//!
//! A Rust client library for the anSpace auth API, with bearer-token
//! handling, transparent token refresh, session state and auth form
//! validation.

pub mod api_client;
pub mod endpoints;
pub mod error;
pub mod normalizer;
pub mod session;
pub mod storage;
pub mod token_store;
pub mod types;
pub mod validation;

pub use api_client::{ApiClient, ApiRequest, ClientConfig};
pub use endpoints::AuthApi;
pub use error::{ClientError, Locale, Result};
pub use session::{guard, Navigation, SessionStore};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use token_store::TokenStore;
pub use types::{AuthCredentials, User};
pub use validation::{AuthForm, FieldError, FormErrors, FormValidator};
