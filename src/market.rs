//! Market-data provider client.
//!
//! The provider has no filing registry: company lookup is a symbol search,
//! statements come from a fundamentals time-series endpoint, and prices from
//! the quote-history API. Results land in small string tables ready to be
//! serialized as CSV; no numeric interpretation happens here (validating the
//! financial data itself is out of scope for the pipeline).

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use yahoo_finance_api as yahoo;

use super::catalog::CalendarPeriod;
use super::company::{Company, SourceKind};
use super::error::{ExtractError, Result};

/// A tabular payload: column headers plus string rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the table as CSV bytes, headers first.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| ExtractError::MarketData(format!("CSV buffer error: {}", e)))
    }
}

/// Statement families the provider's time-series endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

impl StatementKind {
    /// Metric tags requested per statement. The provider prefixes each with
    /// `annual`/`quarterly` depending on the period.
    fn metrics(&self) -> &'static [&'static str] {
        match self {
            StatementKind::Income => &[
                "TotalRevenue",
                "CostOfRevenue",
                "GrossProfit",
                "OperatingIncome",
                "PretaxIncome",
                "NetIncome",
                "DilutedEPS",
            ],
            StatementKind::Balance => &[
                "TotalAssets",
                "CurrentAssets",
                "TotalLiabilitiesNetMinorityInterest",
                "CurrentLiabilities",
                "StockholdersEquity",
                "CashAndCashEquivalents",
            ],
            StatementKind::CashFlow => &[
                "OperatingCashFlow",
                "InvestingCashFlow",
                "FinancingCashFlow",
                "CapitalExpenditure",
                "FreeCashFlow",
            ],
        }
    }
}

/// Client for the market-data provider.
pub struct MarketDataClient {
    connector: yahoo::YahooConnector,
    http: reqwest::Client,
    quote_summary_url: String,
    timeseries_url: String,
}

impl std::fmt::Debug for MarketDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataClient")
            .field("quote_summary_url", &self.quote_summary_url)
            .field("timeseries_url", &self.timeseries_url)
            .finish_non_exhaustive()
    }
}

impl MarketDataClient {
    /// Creates a client with the provider's public endpoints.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            connector: yahoo::YahooConnector::new()?,
            http,
            quote_summary_url: "https://query1.finance.yahoo.com/v10/finance/quoteSummary"
                .to_string(),
            timeseries_url:
                "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries"
                    .to_string(),
        })
    }

    /// Resolves a query to a company.
    ///
    /// The profile lookup (sector, industry, long name) is tried first; when
    /// it fails, one degraded search pass returns symbol and short name with
    /// the remaining fields empty. Only after both miss is the company
    /// reported as not found.
    pub async fn resolve(&self, query: &str) -> Result<Company> {
        match self.profile(query).await {
            Ok(company) => Ok(company),
            Err(err) => {
                tracing::warn!(query, error = %err, "profile lookup failed, trying search");
                self.search(query).await
            }
        }
    }

    /// Full profile lookup by symbol. Success requires a non-empty symbol in
    /// the response.
    async fn profile(&self, query: &str) -> Result<Company> {
        let symbol = query.trim().to_uppercase();
        let url = format!(
            "{}/{}?modules=assetProfile,price",
            self.quote_summary_url, symbol
        );
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let result = body
            .pointer("/quoteSummary/result/0")
            .ok_or_else(|| ExtractError::MarketData("empty quote summary".to_string()))?;

        let found_symbol = result
            .pointer("/price/symbol")
            .and_then(Value::as_str)
            .unwrap_or("");
        if found_symbol.is_empty() {
            return Err(ExtractError::CompanyNotFound(query.to_string()));
        }

        let name = result
            .pointer("/price/longName")
            .or_else(|| result.pointer("/price/shortName"))
            .and_then(Value::as_str)
            .unwrap_or(found_symbol)
            .to_string();
        let text_at = |path: &str| {
            result
                .pointer(path)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(Company {
            ticker: found_symbol.to_uppercase(),
            display_name: name,
            source: SourceKind::MarketData,
            regulatory_id: None,
            sector: text_at("/assetProfile/sector"),
            industry: text_at("/assetProfile/industry"),
        })
    }

    /// Degraded lookup: symbol search, first hit with a non-empty symbol.
    async fn search(&self, query: &str) -> Result<Company> {
        let results = self.connector.search_ticker(query).await?;
        let hit = results
            .quotes
            .iter()
            .find(|quote| !quote.symbol.is_empty())
            .ok_or_else(|| ExtractError::CompanyNotFound(query.to_string()))?;

        let name = if hit.short_name.is_empty() {
            hit.symbol.clone()
        } else {
            hit.short_name.clone()
        };

        Ok(Company {
            ticker: hit.symbol.to_uppercase(),
            display_name: name,
            source: SourceKind::MarketData,
            regulatory_id: None,
            sector: None,
            industry: None,
        })
    }

    /// Fetches one statement table for a calendar period.
    ///
    /// Periods are synthesized by the catalog without checking availability,
    /// so an empty result here is a normal data-layer miss and surfaces as
    /// `DataNotAvailable`.
    pub async fn statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        period: &CalendarPeriod,
    ) -> Result<DataTable> {
        let (start, end) = period.date_range()?;
        let prefix = if period.quarter.is_some() {
            "quarterly"
        } else {
            "annual"
        };
        let types = kind
            .metrics()
            .iter()
            .map(|m| format!("{}{}", prefix, m))
            .collect::<Vec<_>>()
            .join(",");

        let url = format!(
            "{}/{sym}?symbol={sym}&type={types}&period1={p1}&period2={p2}",
            self.timeseries_url,
            sym = symbol,
            types = types,
            p1 = date_timestamp(start, false)?,
            p2 = date_timestamp(end, true)?,
        );
        let body: Value = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let series = parse_timeseries(&body);
        let table = statement_table(&series, kind.metrics(), prefix, start, end);
        if table.is_empty() {
            return Err(ExtractError::DataNotAvailable {
                symbol: symbol.to_string(),
                period: period.suffix(),
            });
        }
        Ok(table)
    }

    /// Fetches daily historical prices across a calendar period.
    pub async fn history(&self, symbol: &str, period: &CalendarPeriod) -> Result<DataTable> {
        let (start, end) = period.date_range()?;
        let start_time = time::OffsetDateTime::from_unix_timestamp(date_timestamp(start, false)?)
            .map_err(|e| ExtractError::MarketData(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(date_timestamp(end, true)?)
            .map_err(|e| ExtractError::MarketData(e.to_string()))?;

        let response = self
            .connector
            .get_quote_history(symbol, start_time, end_time)
            .await?;
        let quotes = response.quotes()?;
        if quotes.is_empty() {
            return Err(ExtractError::DataNotAvailable {
                symbol: symbol.to_string(),
                period: period.suffix(),
            });
        }

        let columns = ["Date", "Open", "High", "Low", "Close", "Volume", "AdjClose"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let rows = quotes
            .iter()
            .map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| q.timestamp.to_string());
                vec![
                    date,
                    format_number(q.open),
                    format_number(q.high),
                    format_number(q.low),
                    format_number(q.close),
                    q.volume.to_string(),
                    format_number(q.adjclose),
                ]
            })
            .collect();

        Ok(DataTable { columns, rows })
    }

    /// Key/value table of the resolved company's metadata. Fields the
    /// degraded lookup could not provide render as `N/A`.
    pub fn company_info(&self, company: &Company) -> DataTable {
        let not_available = "N/A".to_string();
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| not_available.clone());
        DataTable {
            columns: vec!["Field".to_string(), "Value".to_string()],
            rows: vec![
                vec!["Ticker".to_string(), company.ticker.clone()],
                vec!["Name".to_string(), company.display_name.clone()],
                vec!["Source".to_string(), company.source.label().to_string()],
                vec!["Sector".to_string(), field(&company.sector)],
                vec!["Industry".to_string(), field(&company.industry)],
            ],
        }
    }
}

/// Unix timestamp at the start (00:00:00) or end (23:59:59) of a date.
fn date_timestamp(date: NaiveDate, end_of_day: bool) -> Result<i64> {
    let (h, m, s) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
    date.and_hms_opt(h, m, s)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| ExtractError::MarketData(format!("invalid date: {}", date)))
}

/// Renders a reported value without a trailing `.0` for whole numbers.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Flattens the provider's time-series response into
/// `metric -> [(as_of_date, value)]`.
///
/// The response nests one result object per requested metric; the metric's
/// own name is the key holding its data points, so the shape is discovered
/// from `meta.type` rather than assumed.
fn parse_timeseries(body: &Value) -> HashMap<String, Vec<(NaiveDate, f64)>> {
    let mut series: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();

    let results = body
        .pointer("/timeseries/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    for result in &results {
        let Some(metric) = result
            .pointer("/meta/type/0")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };
        let Some(points) = result.get(&metric).and_then(Value::as_array) else {
            continue;
        };

        let entry = series.entry(metric).or_default();
        for point in points {
            let Some(date) = point
                .get("asOfDate")
                .and_then(Value::as_str)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let Some(raw) = point.pointer("/reportedValue/raw").and_then(Value::as_f64) else {
                continue;
            };
            entry.push((date, raw));
        }
    }

    series
}

/// Builds a statement table from parsed series: one row per metric, one
/// column per period-end date (most recent first), restricted to the
/// requested date range.
fn statement_table(
    series: &HashMap<String, Vec<(NaiveDate, f64)>>,
    metrics: &[&str],
    prefix: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> DataTable {
    let mut dates: Vec<NaiveDate> = series
        .values()
        .flatten()
        .map(|(date, _)| *date)
        .filter(|date| *date >= start && *date <= end)
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates.reverse();

    if dates.is_empty() {
        return DataTable {
            columns: Vec::new(),
            rows: Vec::new(),
        };
    }

    let mut columns = vec!["Metric".to_string()];
    columns.extend(dates.iter().map(|d| d.format("%Y-%m-%d").to_string()));

    let rows = metrics
        .iter()
        .map(|metric| {
            let key = format!("{}{}", prefix, metric);
            let points = series.get(&key);
            let mut row = vec![(*metric).to_string()];
            for date in &dates {
                let value = points
                    .and_then(|pts| pts.iter().find(|(d, _)| d == date))
                    .map(|(_, v)| format_number(*v))
                    .unwrap_or_default();
                row.push(value);
            }
            row
        })
        .collect();

    DataTable { columns, rows }
}
