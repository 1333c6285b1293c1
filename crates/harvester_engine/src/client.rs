use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::StreamExt;
use harvester_core::FetchError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use url::Url;

const SEARCH_PATH: &str = "/2/tweets/search/recent";
const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";
const MAX_ERROR_BODY: usize = 512;

/// One recent-search call, already rendered from a `FetchQuery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_results: u32,
    pub fields: Vec<String>,
}

/// Raw body of a successful provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub body: Vec<u8>,
}

/// The provider search capability. Implementations must report rate limiting as
/// `FetchError::RateLimited`.
#[async_trait::async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<ProviderResponse, FetchError>;
}

#[async_trait::async_trait]
impl<C: SearchClient + ?Sized> SearchClient for Arc<C> {
    async fn search(&self, request: &SearchRequest) -> Result<ProviderResponse, FetchError> {
        self.as_ref().search(request).await
    }
}

/// API credentials, passed explicitly to the client that needs them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bearer_token: String,
    pub api_key: Option<String>,
    pub api_key_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: token.into(),
            api_key: None,
            api_key_secret: None,
            access_token: None,
            access_token_secret: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"<redacted>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.x.com".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_response_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Recent-search client over HTTP with bearer authentication.
pub struct HttpSearchClient {
    client: reqwest::Client,
    credentials: Credentials,
    settings: ClientSettings,
}

impl fmt::Debug for HttpSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSearchClient")
            .field("credentials", &self.credentials)
            .field("settings", &self.settings)
            .finish()
    }
}

impl HttpSearchClient {
    pub fn new(credentials: Credentials, settings: ClientSettings) -> Result<Self, FetchError> {
        if credentials.bearer_token.trim().is_empty() {
            return Err(FetchError::Fatal("bearer token is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::Fatal(format!("cannot build http client: {err}")))?;
        Ok(Self {
            client,
            credentials,
            settings,
        })
    }

    fn search_url(&self, request: &SearchRequest) -> Result<Url, FetchError> {
        let endpoint = format!("{}{SEARCH_PATH}", self.settings.base_url.trim_end_matches('/'));
        let start_time = format_timestamp(request.start_time);
        let end_time = format_timestamp(request.end_time);
        let max_results = request.max_results.to_string();
        let fields = request.fields.join(",");
        Url::parse_with_params(
            &endpoint,
            &[
                ("query", request.query.as_str()),
                ("start_time", start_time.as_str()),
                ("end_time", end_time.as_str()),
                ("max_results", max_results.as_str()),
                ("tweet.fields", fields.as_str()),
            ],
        )
        .map_err(|err| FetchError::Fatal(format!("invalid search url {endpoint}: {err}")))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let max_bytes = self.settings.max_response_bytes;
        if let Some(len) = response.content_length() {
            if len > max_bytes {
                return Err(too_large(max_bytes, len));
            }
        }
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<ProviderResponse, FetchError> {
        let url = self.search_url(request)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.credentials.bearer_token)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            let body = self.read_body(response).await?;
            return Ok(ProviderResponse { body });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = rate_limit_hint(response.headers(), Utc::now());
            return Err(FetchError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

/// Serializes calls to a client whose rate-limit budget is shared between sessions.
pub struct SerializedClient<C> {
    inner: C,
    gate: Mutex<()>,
}

impl<C: SearchClient> SerializedClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl<C: SearchClient> SearchClient for SerializedClient<C> {
    async fn search(&self, request: &SearchRequest) -> Result<ProviderResponse, FetchError> {
        let _turn = self.gate.lock().await;
        self.inner.search(request).await
    }
}

/// `2024-03-01T00:00:00Z`, the form the provider expects for window bounds.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// How long the provider asks us to wait, from `retry-after` seconds or the
/// `x-rate-limit-reset` epoch timestamp.
pub fn rate_limit_hint(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
    };

    if let Some(seconds) = header_u64(RETRY_AFTER.as_str()) {
        return Some(Duration::from_secs(seconds));
    }
    let reset = i64::try_from(header_u64(RATE_LIMIT_RESET)?).ok()?;
    let wait = reset.saturating_sub(now.timestamp()).max(0);
    Some(Duration::from_secs(wait as u64))
}

fn classify_status(status: StatusCode, body: &str) -> FetchError {
    let detail = truncate(body.trim(), MAX_ERROR_BODY);
    let message = if detail.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {detail}")
    };
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        FetchError::Transient(message)
    } else {
        // 400 bad query, 401/403 credentials, 404 endpoint, 402/quota: retrying cannot help.
        FetchError::Fatal(message)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Transient(format!("timeout: {err}"));
    }
    if err.is_builder() {
        return FetchError::Fatal(err.to_string());
    }
    FetchError::Transient(format!("network error: {err}"))
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::Transient(format!(
        "response too large (max {max_bytes}, actual {actual})"
    ))
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
