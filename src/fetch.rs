//! Artifact download with strategy fallback.
//!
//! Downloads go through an explicit ranked list of strategies: each runs at
//! most once, in order, and the first success wins. A miss on every strategy
//! is a per-artifact failure the batch layer records and skips past.

use super::client::EdgarClient;
use super::config::RenderApiConfig;
use super::error::{ExtractError, Result};

/// A single way of turning a URL into bytes.
#[derive(Debug, Clone)]
enum FetchStrategy {
    /// Key-authenticated rendering service. More reliable for artifacts the
    /// archives host serves inconsistently, but requires a subscription key.
    RenderApi(RenderApiConfig),
    /// Direct GET against the archives host with the registry User-Agent.
    DirectHttp,
}

impl FetchStrategy {
    fn name(&self) -> &'static str {
        match self {
            FetchStrategy::RenderApi(_) => "render-api",
            FetchStrategy::DirectHttp => "direct-http",
        }
    }
}

/// Fetches artifact bytes through an ordered list of strategies.
///
/// When a rendering-service key is configured the service is tried first and
/// direct HTTP second; otherwise direct HTTP is the only strategy. No
/// strategy is retried individually; resilience beyond the single fallback
/// is out of scope for this pipeline.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: EdgarClient,
    strategies: Vec<FetchStrategy>,
}

impl Downloader {
    /// Builds a downloader over the given client, optionally preferring the
    /// rendering service.
    pub fn new(client: EdgarClient, render_api: Option<RenderApiConfig>) -> Self {
        let mut strategies = Vec::with_capacity(2);
        if let Some(render) = render_api {
            strategies.push(FetchStrategy::RenderApi(render));
        }
        strategies.push(FetchStrategy::DirectHttp);
        Self { client, strategies }
    }

    /// Returns the client the direct strategy downloads through.
    pub fn client(&self) -> &EdgarClient {
        &self.client
    }

    /// Downloads `url`, trying each strategy once in rank order.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::FetchFailed` once every strategy has failed.
    /// Callers treat this as "this one artifact is missing", not as a batch
    /// abort.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        for strategy in &self.strategies {
            match self.run_strategy(strategy, url).await {
                Ok(bytes) => {
                    tracing::debug!(strategy = strategy.name(), url, "download succeeded");
                    return Ok(bytes);
                }
                Err(err) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        url,
                        error = %err,
                        "download strategy failed"
                    );
                }
            }
        }

        Err(ExtractError::FetchFailed {
            url: url.to_string(),
        })
    }

    async fn run_strategy(&self, strategy: &FetchStrategy, url: &str) -> Result<Vec<u8>> {
        match strategy {
            FetchStrategy::RenderApi(render) => {
                let render_url = format!(
                    "{}/?url={}&token={}",
                    render.endpoint.trim_end_matches('/'),
                    url,
                    render.api_key
                );
                // The rendering service is a different host with its own
                // limits, so it bypasses the registry token bucket.
                let response = self.client.client.get(&render_url).send().await?;
                match response.status() {
                    reqwest::StatusCode::OK => Ok(response.bytes().await?.to_vec()),
                    reqwest::StatusCode::NOT_FOUND => Err(ExtractError::NotFound),
                    status => Err(ExtractError::InvalidResponse(format!(
                        "Rendering service returned status {}",
                        status
                    ))),
                }
            }
            FetchStrategy::DirectHttp => self.client.get_bytes(url).await,
        }
    }
}
