/*
[INPUT]:  HTTP configuration (base URL, API key, timeouts) and session state
[OUTPUT]: Configured reqwest client issuing authenticated JSON requests
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing request headers
*/

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::http::{CocobaseError, Result};
use crate::storage::Storage;

/// Base URL of the hosted Cocobase API
pub const DEFAULT_BASE_URL: &str = "https://api.cocobase.com";

const CONTENT_TYPE_JSON: &str = "application/json";
const HEADER_API_KEY: &str = "x-api-key";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Default configuration with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

/// Main HTTP client for the Cocobase API
///
/// Holds the session (token + cached user) and an optional storage backend
/// used to persist it.
#[derive(Debug)]
pub struct CocobaseClient {
    http_client: Client,
    base_url: Url,
    api_key: Option<String>,
    pub(crate) session: Session,
    pub(crate) storage: Option<Arc<dyn Storage>>,
}

impl CocobaseClient {
    /// Create a client for the hosted API with the given key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key))
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base_url = parse_base_url(&config.base_url)?;
        let api_key = config.api_key.filter(|key| !key.is_empty());

        Ok(Self {
            http_client,
            base_url,
            api_key,
            session: Session::new(),
            storage: None,
        })
    }

    /// Create a client whose session is persisted in `storage`
    ///
    /// Call [`CocobaseClient::init_auth`] afterwards to restore a stored session.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.storage = Some(storage);
        Ok(client)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Session shared by every request made through this client
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// Build a URL under the base URL from raw path segments
    ///
    /// Segments are percent-encoded, so ids containing `/` stay one segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        endpoint_from(&self.base_url, segments)
    }

    /// Send a JSON request and fail on any status >= 400
    ///
    /// With `wrap_in_data` the body is sent as `{"data": body}`.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        wrap_in_data: bool,
    ) -> Result<Response> {
        let mut builder = self
            .http_client
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON);

        if let Some(api_key) = &self.api_key {
            builder = builder.header(HEADER_API_KEY, api_key);
        }
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            let payload = if wrap_in_data {
                json!({ "data": body })
            } else {
                body
            };
            builder = builder.json(&payload);
        }

        debug!(method = %method, url = %url, "cocobase request");
        let response = builder.send().await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                "cocobase request failed"
            );
            return Err(CocobaseError::api_error(status, &method, url.as_str(), body));
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "cocobase response");
        Ok(response)
    }

    /// Send a request and decode the JSON response body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        wrap_in_data: bool,
    ) -> Result<T> {
        let response = self.request(method, url, body, wrap_in_data).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim().trim_end_matches('/'))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CocobaseError::Config(format!(
                "base URL must use http or https, got {other}"
            )));
        }
    }
    if url.cannot_be_a_base() {
        return Err(CocobaseError::Config(format!(
            "base URL cannot carry paths: {raw}"
        )));
    }
    Ok(url)
}

pub(crate) fn endpoint_from(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CocobaseError::Config(format!("base URL cannot carry paths: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
