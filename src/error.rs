use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("No {form} filings available for {ticker}")]
    EmptyCatalog { ticker: String, form: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("All download strategies failed for {url}")]
    FetchFailed { url: String },

    #[error("Workbook analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("No data available for {symbol} in {period}")]
    DataNotAvailable { symbol: String, period: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[cfg(any(feature = "sheets", feature = "market"))]
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(any(feature = "sheets", feature = "archive"))]
impl From<zip::result::ZipError> for ExtractError {
    fn from(error: zip::result::ZipError) -> Self {
        ExtractError::ArchiveError(error.to_string())
    }
}

#[cfg(feature = "sheets")]
impl From<quick_xml::Error> for ExtractError {
    fn from(error: quick_xml::Error) -> Self {
        ExtractError::AnalysisFailed(error.to_string())
    }
}

#[cfg(feature = "market")]
impl From<yahoo_finance_api::YahooError> for ExtractError {
    fn from(error: yahoo_finance_api::YahooError) -> Self {
        ExtractError::MarketData(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
