use std::time::Duration;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Rate limit in requests per second (regulatory endpoints)
    pub rate_limit: u32,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Base URLs for the regulatory registry services
    pub base_urls: RegistryUrls,
    /// Optional key-authenticated rendering service, tried before direct
    /// HTTP when present
    pub render_api: Option<RenderApiConfig>,
}

/// Base URLs for the regulatory registry services
#[derive(Debug, Clone)]
pub struct RegistryUrls {
    /// Base URL for the filing archives host
    pub archives: String,
    /// Base URL for the submissions data API
    pub data: String,
    /// Base URL for the static directory files (ticker lookups)
    pub files: String,
}

/// Settings for the key-authenticated rendering service
#[derive(Debug, Clone)]
pub struct RenderApiConfig {
    /// Endpoint of the rendering service
    pub endpoint: String,
    /// API key sent as the `token` query parameter
    pub api_key: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            user_agent: "reportkit/0.1.0".to_string(),
            rate_limit: 10,
            timeout: Duration::from_secs(30),
            base_urls: RegistryUrls::default(),
            render_api: None,
        }
    }
}

impl ExtractorConfig {
    /// Creates a new ExtractorConfig with custom settings
    ///
    /// # Basic usage
    ///
    /// ```rust
    /// use reportkit::{ExtractorConfig, RegistryUrls};
    /// use std::time::Duration;
    /// let config = ExtractorConfig {
    ///    user_agent: "YourAppName contact@example.com".to_string(),
    ///    rate_limit: 10, // requests per second
    ///    timeout: Duration::from_secs(30),
    ///    base_urls: RegistryUrls::default(),
    ///    render_api: None,
    /// };
    /// ```
    pub fn new(
        user_agent: impl Into<String>,
        rate_limit: u32,
        timeout: Duration,
        base_urls: Option<RegistryUrls>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            rate_limit,
            timeout,
            base_urls: base_urls.unwrap_or_default(),
            render_api: None,
        }
    }

    /// Enables the rendering-service download strategy with the given key.
    pub fn with_render_api(
        mut self,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.render_api = Some(RenderApiConfig {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        });
        self
    }
}

impl Default for RegistryUrls {
    fn default() -> Self {
        Self {
            archives: "https://www.sec.gov/Archives/edgar".to_string(),
            data: "https://data.sec.gov".to_string(),
            files: "https://www.sec.gov/files".to_string(),
        }
    }
}

impl Default for RenderApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://archive.sec-api.io".to_string(),
            api_key: String::new(),
        }
    }
}
