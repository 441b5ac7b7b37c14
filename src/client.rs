use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::config::ExtractorConfig;
use super::error::{ExtractError, Result};

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Rate-limited HTTP client for the regulatory registry.
///
/// The client identifies itself with the configured User-Agent on every
/// request (the registry requires this for automated access) and throttles
/// requests through a token bucket so batch downloads stay inside the
/// registry's fair-access ceiling of 10 requests per second:
///
/// ```text
/// Token Bucket (capacity: 10 tokens)
/// ┌──────────────────────────┐
/// │ ████████████████████████ │  ← Tokens refill at 10/sec
/// └──────────────────────────┘
///      ↓ consume on request
/// ```
///
/// When the bucket is empty, requests wait until tokens become available, so
/// callers never need to throttle manually.
///
/// Each request is made exactly once. Download resilience is handled one
/// level up by the [`Downloader`](crate::Downloader)'s strategy fallback; a
/// failed artifact is reported to the caller rather than retried here.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    /// HTTP client for making requests
    pub(crate) client: reqwest::Client,

    /// Token bucket rate limiter for registry compliance
    rate_limiter: Arc<Governor>,

    /// Base URL for the filing archives host
    pub(crate) archives_url: String,

    /// Base URL for the submissions data API
    pub(crate) data_url: String,

    /// Base URL for the static directory files
    pub(crate) files_url: String,
}

impl EdgarClient {
    /// Creates a new client with sensible defaults.
    ///
    /// Initializes the client with a rate limit of 10 requests per second, a
    /// 30-second timeout, and the standard registry base URLs. The user agent
    /// you provide is sent with every request; the registry uses it to contact
    /// you if your application causes issues, so provide valid contact
    /// information.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use reportkit::EdgarClient;
    /// let client = EdgarClient::new("my_app/1.0 (email@example.com)")?;
    /// ```
    pub fn new(user_agent: &str) -> Result<Self> {
        let config = ExtractorConfig {
            user_agent: user_agent.to_string(),
            ..ExtractorConfig::default()
        };
        Self::with_config(&config)
    }

    /// Creates a client from a full [`ExtractorConfig`].
    ///
    /// Use this when you need a custom rate limit, timeout, or base URLs,
    /// for example to point the client at a mock server in tests.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::ConfigError` if the user agent is malformed,
    /// the rate limit is zero, or the HTTP client cannot be built.
    pub fn with_config(config: &ExtractorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ExtractError::ConfigError(format!("Invalid user agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.rate_limit).ok_or_else(|| {
                ExtractError::ConfigError("Rate limit must be greater than zero".to_string())
            })?,
        )));

        Ok(EdgarClient {
            client,
            rate_limiter,
            archives_url: config.base_urls.archives.clone(),
            data_url: config.base_urls.data.clone(),
            files_url: config.base_urls.files.clone(),
        })
    }

    /// Fetches binary data from a URL, respecting the rate limit.
    ///
    /// This is the method the download pipeline uses for filing artifacts
    /// (spreadsheets, HTML statement fragments). The request is made once;
    /// a 404 maps to `NotFound` and a 429 to `RateLimitExceeded` so the
    /// caller can record the artifact as missing and move on.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ExtractError::RequestError)?;

        match response.status() {
            reqwest::StatusCode::OK => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(ExtractError::RequestError),
            reqwest::StatusCode::NOT_FOUND => Err(ExtractError::NotFound),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(ExtractError::RateLimitExceeded),
            status => Err(ExtractError::InvalidResponse(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }

    /// Fetches text content from a URL, respecting the rate limit.
    ///
    /// Used for the registry's JSON endpoints (ticker directories, the
    /// submissions index). For URLs ending in `.json` the method guards
    /// against HTML error pages served with a success status: if the body
    /// does not look like JSON, an `InvalidResponse` with a content preview
    /// is returned instead of handing garbage to the deserializer.
    pub async fn get(&self, url: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ExtractError::RequestError)?;

        let status = response.status();
        match status {
            reqwest::StatusCode::OK => {
                let body = response.text().await.map_err(ExtractError::RequestError)?;
                if url.ends_with(".json")
                    && !(body.trim_start().starts_with('{') || body.trim_start().starts_with('['))
                {
                    let preview = body.chars().take(200).collect::<String>();
                    return Err(ExtractError::InvalidResponse(format!(
                        "Expected JSON from {} but got: {}",
                        url, preview
                    )));
                }
                Ok(body)
            }
            reqwest::StatusCode::NOT_FOUND => Err(ExtractError::NotFound),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(ExtractError::RateLimitExceeded),
            other_status => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error body".to_string());

                Err(ExtractError::InvalidResponse(format!(
                    "Unexpected status code: {} for URL: {}. Response preview: {}",
                    other_status,
                    url,
                    error_body.chars().take(200).collect::<String>()
                )))
            }
        }
    }

    /// Returns the base URL for the filing archives host.
    pub fn archives_url(&self) -> &str {
        &self.archives_url
    }

    /// Returns the base URL for the submissions data API.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Returns the base URL for the static directory files.
    pub fn files_url(&self) -> &str {
        &self.files_url
    }
}
