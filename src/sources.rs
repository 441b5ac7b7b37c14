//! Source abstraction over the regulatory registry and the market-data
//! provider.
//!
//! The two backends expose the same four operations (resolve a company,
//! enumerate reporting periods, describe the downloadable artifacts for a
//! period, and fetch one artifact's bytes), so the extraction orchestrator
//! never branches on where data comes from. Implementations keep their own
//! clients and failure modes behind the trait.

use async_trait::async_trait;

#[cfg(feature = "market")]
use super::artifacts::MarketArtifact;
use super::artifacts::{ArtifactDescriptor, ArtifactKind, ArtifactLocation, report_urls};
#[cfg(feature = "market")]
use super::catalog::calendar_periods;
use super::catalog::{FormType, ReportingPeriod, SubmissionsIndex, filing_periods};
use super::client::EdgarClient;
use super::company::{
    Company, CompanyTicker, ExchangeDirectory, SourceKind, company_for_cik,
    match_exchange_directory, match_static_table, match_ticker_directory, parse_ticker_directory,
};
use super::config::ExtractorConfig;
use super::error::{ExtractError, Result};
use super::fetch::Downloader;

/// The four operations every data source supports.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Which backend this source talks to.
    fn kind(&self) -> SourceKind;

    /// Resolves a free-text ticker or company name to a [`Company`].
    async fn resolve(&self, query: &str) -> Result<Company>;

    /// Enumerates reporting periods for a company, most recent first,
    /// truncated to `limit`. The returned list is fully materialized and may
    /// be re-requested any number of times.
    async fn list_periods(
        &self,
        company: &Company,
        form: FormType,
        limit: usize,
    ) -> Result<Vec<ReportingPeriod>>;

    /// Describes the artifacts available for one period.
    fn build_artifacts(
        &self,
        company: &Company,
        period: &ReportingPeriod,
    ) -> Result<Vec<ArtifactDescriptor>>;

    /// Fetches one artifact's bytes, ready to write to disk or an archive.
    async fn fetch(
        &self,
        company: &Company,
        period: &ReportingPeriod,
        artifact: &ArtifactDescriptor,
    ) -> Result<Vec<u8>>;
}

/// Data source backed by the regulatory filing registry.
#[derive(Debug, Clone)]
pub struct RegulatoryFilingSource {
    client: EdgarClient,
    downloader: Downloader,
}

impl RegulatoryFilingSource {
    /// Creates a source with default configuration and the given user agent.
    pub fn new(user_agent: &str) -> Result<Self> {
        let config = ExtractorConfig {
            user_agent: user_agent.to_string(),
            ..ExtractorConfig::default()
        };
        Self::with_config(&config)
    }

    /// Creates a source from a full configuration, including the optional
    /// rendering-service download strategy.
    pub fn with_config(config: &ExtractorConfig) -> Result<Self> {
        let client = EdgarClient::with_config(config)?;
        let downloader = Downloader::new(client.clone(), config.render_api.clone());
        Ok(Self { client, downloader })
    }

    /// The underlying rate-limited client.
    pub fn client(&self) -> &EdgarClient {
        &self.client
    }

    async fn ticker_directory(&self) -> Result<Vec<CompanyTicker>> {
        let url = format!("{}/company_tickers.json", self.client.files_url());
        let body = self.client.get(&url).await?;
        parse_ticker_directory(&body)
    }

    async fn exchange_directory(&self) -> Result<ExchangeDirectory> {
        let url = format!("{}/company_tickers_exchange.json", self.client.files_url());
        let body = self.client.get(&url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches the full submissions index for a zero-padded identifier.
    pub async fn submissions(&self, regulatory_id: &str) -> Result<SubmissionsIndex> {
        let url = format!(
            "{}/submissions/CIK{}.json",
            self.client.data_url(),
            regulatory_id
        );
        let body = self.client.get(&url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Reverse lookup: company identity for a known identifier.
    pub async fn company_for_id(&self, regulatory_id: &str) -> Result<Company> {
        let directory = self.ticker_directory().await?;
        company_for_cik(&directory, regulatory_id)
    }

    fn regulatory_id<'a>(&self, company: &'a Company) -> Result<&'a str> {
        company.regulatory_id.as_deref().ok_or_else(|| {
            ExtractError::InvalidParameter(format!(
                "Company {} has no regulatory identifier",
                company.ticker
            ))
        })
    }
}

#[async_trait]
impl DataSource for RegulatoryFilingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Regulatory
    }

    /// Resolution chain: primary directory, secondary directory, then the
    /// built-in table. Each stage is consulted whether the previous one
    /// errored or simply found nothing. First match wins, no ranking.
    async fn resolve(&self, query: &str) -> Result<Company> {
        match self.ticker_directory().await {
            Ok(directory) => {
                if let Some(company) = match_ticker_directory(&directory, query) {
                    return Ok(company);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "primary ticker directory unavailable");
            }
        }

        match self.exchange_directory().await {
            Ok(directory) => {
                if let Some(company) = match_exchange_directory(&directory, query) {
                    return Ok(company);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "secondary ticker directory unavailable");
            }
        }

        match_static_table(query).ok_or_else(|| ExtractError::CompanyNotFound(query.to_string()))
    }

    async fn list_periods(
        &self,
        company: &Company,
        form: FormType,
        limit: usize,
    ) -> Result<Vec<ReportingPeriod>> {
        let regulatory_id = self.regulatory_id(company)?;
        let index = self.submissions(regulatory_id).await?;
        let periods = filing_periods(&index.filings.recent, form, limit);
        if periods.is_empty() {
            return Err(ExtractError::EmptyCatalog {
                ticker: company.ticker.clone(),
                form: form.registry_form().to_string(),
            });
        }
        Ok(periods)
    }

    fn build_artifacts(
        &self,
        company: &Company,
        period: &ReportingPeriod,
    ) -> Result<Vec<ArtifactDescriptor>> {
        let regulatory_id = self.regulatory_id(company)?;
        let ReportingPeriod::Filing(filing) = period else {
            return Err(ExtractError::InvalidParameter(
                "Regulatory artifacts require a filed period".to_string(),
            ));
        };

        Ok(
            report_urls(self.client.archives_url(), regulatory_id, &filing.accession)
                .into_iter()
                .map(|(kind, url)| ArtifactDescriptor {
                    kind: ArtifactKind::Filing(kind),
                    location: ArtifactLocation::Remote(url),
                })
                .collect(),
        )
    }

    async fn fetch(
        &self,
        _company: &Company,
        _period: &ReportingPeriod,
        artifact: &ArtifactDescriptor,
    ) -> Result<Vec<u8>> {
        match &artifact.location {
            ArtifactLocation::Remote(url) => self.downloader.fetch(url).await,
            ArtifactLocation::Derived => Err(ExtractError::InvalidParameter(
                "Regulatory artifacts are always remote".to_string(),
            )),
        }
    }
}

/// Data source backed by the market-data provider.
#[cfg(feature = "market")]
#[derive(Debug)]
pub struct MarketDataSource {
    client: super::market::MarketDataClient,
}

#[cfg(feature = "market")]
impl MarketDataSource {
    /// Creates a source with the provider's public endpoints.
    pub fn new(user_agent: &str) -> Result<Self> {
        let config = ExtractorConfig::default();
        Ok(Self {
            client: super::market::MarketDataClient::new(user_agent, config.timeout)?,
        })
    }

    fn statement_kind(artifact: MarketArtifact) -> Option<super::market::StatementKind> {
        use super::market::StatementKind;
        match artifact {
            MarketArtifact::IncomeStatement => Some(StatementKind::Income),
            MarketArtifact::BalanceSheet => Some(StatementKind::Balance),
            MarketArtifact::CashFlow => Some(StatementKind::CashFlow),
            MarketArtifact::CompanyInfo | MarketArtifact::HistoricalPrices => None,
        }
    }
}

#[cfg(feature = "market")]
#[async_trait]
impl DataSource for MarketDataSource {
    fn kind(&self) -> SourceKind {
        SourceKind::MarketData
    }

    async fn resolve(&self, query: &str) -> Result<Company> {
        self.client.resolve(query).await
    }

    /// Periods are synthesized from the calendar, not discovered: the
    /// provider offers no period index, so availability is only learned at
    /// fetch time.
    async fn list_periods(
        &self,
        _company: &Company,
        form: FormType,
        limit: usize,
    ) -> Result<Vec<ReportingPeriod>> {
        use chrono::Datelike;
        let latest_year = chrono::Utc::now().year();
        let mut periods = calendar_periods(latest_year, form)?;
        periods.truncate(limit);
        Ok(periods.into_iter().map(ReportingPeriod::Calendar).collect())
    }

    fn build_artifacts(
        &self,
        _company: &Company,
        period: &ReportingPeriod,
    ) -> Result<Vec<ArtifactDescriptor>> {
        let ReportingPeriod::Calendar(_) = period else {
            return Err(ExtractError::InvalidParameter(
                "Market artifacts require a calendar period".to_string(),
            ));
        };

        Ok(MarketArtifact::ALL
            .iter()
            .map(|artifact| ArtifactDescriptor {
                kind: ArtifactKind::Market(*artifact),
                location: ArtifactLocation::Derived,
            })
            .collect())
    }

    async fn fetch(
        &self,
        company: &Company,
        period: &ReportingPeriod,
        artifact: &ArtifactDescriptor,
    ) -> Result<Vec<u8>> {
        let ReportingPeriod::Calendar(calendar) = period else {
            return Err(ExtractError::InvalidParameter(
                "Market artifacts require a calendar period".to_string(),
            ));
        };
        let ArtifactKind::Market(market_artifact) = artifact.kind else {
            return Err(ExtractError::InvalidParameter(
                "Not a market artifact".to_string(),
            ));
        };

        let table = match market_artifact {
            MarketArtifact::CompanyInfo => self.client.company_info(company),
            MarketArtifact::HistoricalPrices => {
                self.client.history(&company.ticker, calendar).await?
            }
            statement => {
                let kind = Self::statement_kind(statement)
                    .ok_or_else(|| ExtractError::InvalidParameter("Not a statement".to_string()))?;
                self.client.statement(&company.ticker, kind, calendar).await?
            }
        };

        table.to_csv_bytes()
    }
}
