//! HTTP page fetcher
//!
//! Issues exactly one GET per call. A non-2xx status is not an error at this
//! layer: the status, body text and (when decodable) JSON body are handed
//! back so the driver can decide between retrying and giving up.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{JsonValue, ParamMap};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("civic-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// One fetched page, successful or not
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Raw body text
    pub text: String,
    /// Decoded JSON body, when the body parsed
    pub body: Option<JsonValue>,
    /// Server-requested delay before retrying, from `Retry-After`
    pub retry_after: Option<Duration>,
}

impl FetchedPage {
    /// A successful page with a JSON body
    pub fn ok(body: JsonValue) -> Self {
        Self {
            status: 200,
            text: body.to_string(),
            body: Some(body),
            retry_after: None,
        }
    }

    /// A failed page with the given status and body text
    pub fn status(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            status,
            body: serde_json::from_str(&text).ok(),
            text,
            retry_after: None,
        }
    }

    /// Whether the status was 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert into the decoded body, or the error this page represents
    ///
    /// Non-2xx statuses become `HttpStatus`; a 2xx page that is not JSON
    /// becomes an extraction error.
    pub fn into_body(self) -> Result<JsonValue> {
        if !self.is_success() {
            return Err(Error::http_status(self.status, truncate(&self.text, 512)));
        }
        self.body.ok_or_else(|| {
            Error::extraction(format!(
                "response body is not JSON: {}",
                truncate(&self.text, 128)
            ))
        })
    }
}

/// A source of pages: anything that can GET a URL with query parameters
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page. Transport failures are errors; HTTP error statuses are not.
    async fn fetch(&self, url: &str, params: &ParamMap) -> Result<FetchedPage>;
}

/// HTTP client with rate limiting and a bounded per-request timeout
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Perform one GET and classify the outcome
    pub async fn get_page(&self, url: &str, params: &ParamMap) -> Result<FetchedPage> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(url);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !params.is_empty() {
            req = req.query(params);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let final_url = response.url().to_string();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).ok();

        if status.is_success() {
            debug!("GET {final_url} -> {}", status.as_u16());
        } else {
            warn!(
                "GET {final_url} -> {}: {}",
                status.as_u16(),
                truncate(&text, 200)
            );
        }

        Ok(FetchedPage {
            status: status.as_u16(),
            text,
            body,
            retry_after,
        })
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch(&self, url: &str, params: &ParamMap) -> Result<FetchedPage> {
        self.get_page(url, params).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
