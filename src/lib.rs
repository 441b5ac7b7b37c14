//! # Reportkit - find and download SEC financial reports
//!
//! Reportkit turns "which company, which filings, which files" into bytes on
//! disk: it resolves a ticker or company name, enumerates reporting periods,
//! builds the deterministic URL and filename set for each period's
//! artifacts, downloads them with a two-strategy fallback, and writes the
//! results into a `{ticker}/{form}/{year}/` tree or a single ZIP archive.
//! Downloaded financial report workbooks have their consolidated sheets
//! auto-exported as CSV.
//!
//! ## Features
//!
//! - **Rate-limited HTTP client** - Complies with the registry's fair access rules
//! - **Company resolution** - Ticker directories with layered fallbacks
//! - **Filing catalog** - Period lists from the submissions index
//! - **Market-data source** - Statement, price, and profile snapshots
//! - **Sheet analysis** - Lexical classification and automatic CSV export
//! - **Batch extraction** - Folder or ZIP output, per-artifact failure isolation
//!
//! ## Requirements
//!
//! Reportkit is an async-first library and requires an async runtime. We
//! recommend [tokio](https://tokio.rs), which is the most widely used async
//! runtime in the Rust ecosystem.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use reportkit::{
//!     ArtifactKind, DataSource, Destination, ExtractOptions, ExtractionSession, FormType,
//!     RegulatoryFilingSource, extract,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Initialize with a proper user agent (required by the registry)
//!     let source = RegulatoryFilingSource::new("YourAppName contact@example.com")?;
//!
//!     let company = source.resolve("AAPL").await?;
//!     let periods = source
//!         .list_periods(&company, FormType::QuarterlyReport, 3)
//!         .await?;
//!
//!     let session = ExtractionSession::new(company, FormType::QuarterlyReport, periods, vec![]);
//!     let report = extract(
//!         &source,
//!         &session,
//!         &Destination::LocalFolder("sec-data".into()),
//!         &ExtractOptions::default(),
//!     )
//!     .await?;
//!
//!     println!("{} files written, {} failures", report.success_count(), report.failure_count());
//!     Ok(())
//! }
//! ```

mod artifacts;
mod catalog;
mod client;
mod company;
mod config;
mod error;
mod extract;
mod fetch;
mod sources;

// Conditionally include modules
#[cfg(feature = "market")]
mod market;
#[cfg(feature = "sheets")]
mod sheets;

// Core configuration and errors (always available)
pub use config::{ExtractorConfig, RegistryUrls, RenderApiConfig};
pub use error::{ExtractError, Result};

// Clients and download strategies
pub use client::EdgarClient;
pub use fetch::Downloader;

// Data model
pub use artifacts::{
    ArtifactDescriptor, ArtifactKind, ArtifactLocation, FilingArtifact, MarketArtifact,
    artifact_filename, market_filename, report_urls, safe_filename, sanitize_sheet_name,
    sheet_csv_filename,
};
pub use catalog::{
    CalendarPeriod, FilingHistory, FilingPeriod, FormType, RecentFilings, ReportingPeriod,
    SubmissionsIndex, calendar_periods, filing_periods,
};
pub use company::{
    Company, CompanyTicker, ExchangeDirectory, SourceKind, company_for_cik,
    match_exchange_directory, match_static_table, match_ticker_directory, parse_ticker_directory,
    zero_pad_cik,
};

// Sources and extraction
pub use extract::{
    Destination, ExtractFailure, ExtractOptions, ExtractReport, ExtractionSession,
    archive_file_name, extract,
};
pub use sources::{DataSource, RegulatoryFilingSource};

#[cfg(feature = "market")]
pub use market::{DataTable, MarketDataClient, StatementKind};
#[cfg(feature = "market")]
pub use sources::MarketDataSource;

#[cfg(feature = "sheets")]
pub use sheets::{
    Sheet, SheetClassification, SheetSelection, SheetSummary, Workbook, auto_select, classify,
    export_sheets, resolve_selection, sheet_to_csv,
};

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
