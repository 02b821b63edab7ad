//! HTTP client with bearer-token handling and transparent token refresh

use crate::error::{ClientError, Locale, Result};
use crate::normalizer::{normalize, ApiFailure};
use crate::token_store::TokenStore;
use crate::types::{AccessTokenResponse, Envelope};
use async_singleflight::Group;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_API_PREFIX: &str = "/api/v1";
const REFRESH_PATH: &str = "/auth/refresh";
const REFRESH_SINGLEFLIGHT_KEY: &str = "refresh";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://api.example.com`
    pub backend_url: String,

    /// Path prefix joined between the origin and every endpoint path
    /// Default: `/api/v1`
    pub api_prefix: String,

    /// How many refresh-and-retry cycles a single call may perform after the
    /// server reports an expired token
    /// Default: 1
    pub max_refresh_attempts: u32,

    /// Per-request timeout. `None` keeps the transport default.
    pub request_timeout: Option<Duration>,

    /// Language for user-facing error messages
    pub locale: Locale,
}

impl ClientConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            max_refresh_attempts: 1,
            request_timeout: None,
            locale: Locale::default(),
        }
    }

    /// Build a config from environment variables
    ///
    /// `BACKEND_URL` is required. `API_PREFIX`, `MAX_REFRESH_ATTEMPTS`,
    /// `REQUEST_TIMEOUT_SECS` and `CLIENT_LOCALE` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("BACKEND_URL")
            .ok_or_else(|| ClientError::Configuration("BACKEND_URL is not set".to_string()))?;
        let mut config = Self::new(backend_url);

        if let Some(prefix) = lookup("API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Some(raw) = lookup("MAX_REFRESH_ATTEMPTS") {
            config.max_refresh_attempts = raw.parse().map_err(|e| {
                ClientError::Configuration(format!("invalid MAX_REFRESH_ATTEMPTS {raw:?}: {e}"))
            })?;
        }
        if let Some(raw) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|e| {
                ClientError::Configuration(format!("invalid REQUEST_TIMEOUT_SECS {raw:?}: {e}"))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup("CLIENT_LOCALE") {
            config.locale = Locale::from_tag(&raw).ok_or_else(|| {
                ClientError::Configuration(format!("unsupported CLIENT_LOCALE {raw:?}"))
            })?;
        }

        Ok(config)
    }

    /// Absolute base URL every endpoint path is appended to
    pub fn base_url(&self) -> String {
        let origin = self.backend_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_end_matches('/');
        if prefix.is_empty() || prefix.starts_with('/') {
            format!("{origin}{prefix}")
        } else {
            format!("{origin}/{prefix}")
        }
    }

    fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.backend_url).map_err(|e| {
            ClientError::Configuration(format!("invalid backend url {:?}: {e}", self.backend_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "backend url must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(())
    }
}

/// A single call against the API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Attach the stored access token as a bearer header
    pub protected: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            protected: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Mark the call as requiring the access token
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }
}

/// API client with bearer-token handling and refresh-on-expiry
pub struct ApiClient {
    config: ClientConfig,
    base_url: String,
    token_store: TokenStore,
    http_client: Client,
    /// Singleflight group so concurrent callers that hit an expired token
    /// share one refresh round trip
    refresh_singleflight: Group<String, Arc<ClientError>>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `config` - Client configuration
    /// * `token_store` - Where the access token is read from and written to
    pub fn new(config: ClientConfig, token_store: TokenStore) -> Result<Arc<Self>> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // The refresh token travels as a cookie, so keep a jar for it
        let mut builder = Client::builder()
            .default_headers(headers)
            .cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build http client: {e}")))?;

        let base_url = config.base_url();
        info!(base_url = %base_url, "API client created");

        Ok(Arc::new(Self {
            config,
            base_url,
            token_store,
            http_client,
            refresh_singleflight: Group::new(),
        }))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the token store (for advanced usage)
    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    /// Render an error in the configured locale
    pub fn localize(&self, err: &ClientError) -> String {
        err.localized(self.config.locale)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the payload
    pub async fn get<T: DeserializeOwned>(&self, path: &str, protected: bool) -> Result<T> {
        let mut request = ApiRequest::get(path);
        request.protected = protected;
        self.call(&request).await
    }

    /// POST `body` to `path` and decode the payload
    pub async fn post<T, B>(&self, path: &str, body: &B, protected: bool) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = ApiRequest::post(path).json(body)?;
        request.protected = protected;
        self.call(&request).await
    }

    /// Perform the call, refreshing the access token and retrying when the
    /// server reports it as expired
    pub async fn call<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send_with_refresh(request).await?;
        decode(response).await
    }

    /// Like [`ApiClient::call`] for endpoints that answer without a payload
    pub async fn call_unit(&self, request: &ApiRequest) -> Result<()> {
        self.send_with_refresh(request).await?;
        Ok(())
    }

    /// Perform the call exactly once, without refresh-on-expiry
    pub async fn call_once<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        decode(response).await
    }

    async fn send_with_refresh(&self, request: &ApiRequest) -> Result<Response> {
        let mut refreshes = 0;
        loop {
            match self.send(request).await {
                Err(e) if e.is_token_expired() && refreshes < self.config.max_refresh_attempts => {
                    refreshes += 1;
                    warn!(
                        path = %request.path,
                        attempt = refreshes,
                        "Access token expired, refreshing before retry"
                    );
                    self.refresh().await?;
                }
                other => return other,
            }
        }
    }

    /// Send one request and turn every non-success outcome into an error
    async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let url = self.url(&request.path);
        let mut builder = self.http_client.request(request.method.clone(), &url);

        if request.protected {
            let token = self.token_store.get()?.ok_or(ClientError::MissingToken)?;
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            protected = request.protected,
            "Sending request"
        );

        let response = builder
            .send()
            .await
            .map_err(|e| normalize(ApiFailure::Transport(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize(ApiFailure::Status { status, body }));
        }

        Ok(response)
    }

    /// Exchange the stored (possibly expired) access token and the refresh
    /// cookie for a new access token
    ///
    /// Concurrent callers share a single refresh request.
    pub async fn refresh(&self) -> Result<String> {
        let key = REFRESH_SINGLEFLIGHT_KEY.to_string();
        let (success_opt, error_opt, _shared) = self
            .refresh_singleflight
            .work(&key, async {
                match self.do_refresh().await {
                    Ok(token) => Ok(token),
                    Err(e) => {
                        warn!(error = %e, "Token refresh failed");
                        Err(Arc::new(e))
                    }
                }
            })
            .await;

        match (success_opt, error_opt) {
            (Some(token), None) => Ok(token),
            (None, Some(err)) => Err(ClientError::RefreshFailed(err)),
            _ => Err(ClientError::Unexpected(
                "Unknown error during token refresh".to_string(),
            )),
        }
    }

    async fn do_refresh(&self) -> Result<String> {
        let request = ApiRequest::post(REFRESH_PATH).protected();
        let response: AccessTokenResponse = self.call_once(&request).await?;

        self.token_store.store(&response.access_token)?;
        info!("Access token refreshed successfully");

        Ok(response.access_token)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| normalize(ApiFailure::Transport(e)))?;

    serde_json::from_str::<Envelope<T>>(&body)
        .map(Envelope::into_inner)
        .map_err(|e| normalize(ApiFailure::Service(format!("invalid response body: {e}"))))
}
