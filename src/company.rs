//! Company identity resolution.
//!
//! Everything downstream of a search box needs a canonical identifier: the
//! zero-padded CIK for the regulatory registry, or the bare ticker symbol for
//! the market-data provider. This module holds the company value itself plus
//! the regulatory lookup chain: the primary ticker directory, a secondary
//! directory with a positional schema, and a last-resort static table of
//! well-known tickers. First match wins; there is no ranking across sources.
//!
//! The matching functions are pure over already-fetched directory data, so
//! they can be exercised against fixtures without a network.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::{ExtractError, Result};

/// Which external service a company was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The regulatory filing registry (CIK-keyed).
    Regulatory,
    /// The market-data provider (ticker-keyed).
    MarketData,
}

impl SourceKind {
    /// Human-readable source label used in progress output.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Regulatory => "regulatory registry",
            SourceKind::MarketData => "market data",
        }
    }
}

/// A resolved company, immutable for the rest of the extraction session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    /// Ticker symbol, uppercased.
    pub ticker: String,
    /// Official display name as reported by the source.
    pub display_name: String,
    /// The source this company was resolved against.
    pub source: SourceKind,
    /// Zero-padded 10-digit registry identifier; present for regulatory
    /// resolutions and for market resolutions only when known.
    pub regulatory_id: Option<String>,
    /// Sector, when the market-data profile provides one.
    pub sector: Option<String>,
    /// Industry, when the market-data profile provides one.
    pub industry: Option<String>,
}

/// One row of the registry's primary ticker directory.
///
/// The directory is a JSON object keyed by row number
/// (`{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}`).
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTicker {
    #[serde(rename = "cik_str")]
    pub cik: u64,
    pub ticker: String,
    pub title: String,
}

/// The secondary ticker directory, which uses a positional schema:
/// `{"fields": ["cik", "name", "ticker", "exchange"], "data": [[...], ...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeDirectory {
    pub fields: Vec<String>,
    pub data: Vec<Vec<serde_json::Value>>,
}

/// Zero-pads a numeric registry identifier to the canonical 10 digits.
pub fn zero_pad_cik(cik: u64) -> String {
    format!("{:010}", cik)
}

/// Parses the primary ticker directory, preserving the source's row order.
///
/// The numeric object keys define the order companies appear in; matching is
/// first-match-wins, so the order must survive deserialization.
pub fn parse_ticker_directory(json: &str) -> Result<Vec<CompanyTicker>> {
    let keyed: BTreeMap<String, CompanyTicker> = serde_json::from_str(json)?;
    let mut rows: Vec<(u64, CompanyTicker)> = keyed
        .into_iter()
        .filter_map(|(key, row)| key.parse::<u64>().ok().map(|idx| (idx, row)))
        .collect();
    rows.sort_by_key(|(idx, _)| *idx);
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

/// Matches a query against the primary ticker directory.
///
/// The query is uppercased and trimmed; an exact ticker match anywhere in the
/// directory beats a substring match on the display name.
pub fn match_ticker_directory(companies: &[CompanyTicker], query: &str) -> Option<Company> {
    let term = query.trim().to_uppercase();
    if term.is_empty() {
        return None;
    }

    let found = companies
        .iter()
        .find(|row| row.ticker.to_uppercase() == term)
        .or_else(|| {
            companies
                .iter()
                .find(|row| row.title.to_uppercase().contains(&term))
        })?;

    Some(Company {
        ticker: found.ticker.to_uppercase(),
        display_name: found.title.clone(),
        source: SourceKind::Regulatory,
        regulatory_id: Some(zero_pad_cik(found.cik)),
        sector: None,
        industry: None,
    })
}

/// Matches a query against the secondary (positional-schema) directory.
pub fn match_exchange_directory(directory: &ExchangeDirectory, query: &str) -> Option<Company> {
    let term = query.trim().to_uppercase();
    if term.is_empty() {
        return None;
    }

    let col = |name: &str| directory.fields.iter().position(|f| f == name);
    let (cik_idx, name_idx, ticker_idx) = (col("cik")?, col("name")?, col("ticker")?);

    let field_str = |row: &[serde_json::Value], idx: usize| -> Option<String> {
        row.get(idx).and_then(|v| v.as_str()).map(str::to_string)
    };
    let build = |row: &[serde_json::Value]| -> Option<Company> {
        let cik = row.get(cik_idx)?.as_u64()?;
        Some(Company {
            ticker: field_str(row, ticker_idx)?.to_uppercase(),
            display_name: field_str(row, name_idx)?,
            source: SourceKind::Regulatory,
            regulatory_id: Some(zero_pad_cik(cik)),
            sector: None,
            industry: None,
        })
    };

    if let Some(row) = directory.data.iter().find(|row| {
        field_str(row, ticker_idx).is_some_and(|t| t.to_uppercase() == term)
    }) {
        return build(row);
    }
    directory
        .data
        .iter()
        .find(|row| field_str(row, name_idx).is_some_and(|n| n.to_uppercase().contains(&term)))
        .and_then(|row| build(row))
}

/// Built-in table of well-known tickers, used when both remote directories
/// are unreachable.
const WELL_KNOWN_TICKERS: &[(&str, &str, &str)] = &[
    ("AAPL", "0000320193", "Apple Inc."),
    ("MSFT", "0000789019", "Microsoft Corporation"),
    ("GOOGL", "0001652044", "Alphabet Inc."),
    ("GOOG", "0001652044", "Alphabet Inc."),
    ("AMZN", "0001018724", "Amazon.com Inc."),
    ("TSLA", "0001318605", "Tesla Inc."),
    ("META", "0001326801", "Meta Platforms Inc."),
    ("NVDA", "0001045810", "NVIDIA Corporation"),
    ("NFLX", "0001065280", "Netflix Inc."),
    ("ORCL", "0001341439", "Oracle Corporation"),
    ("IBM", "0000051143", "International Business Machines"),
    ("INTC", "0000050863", "Intel Corporation"),
    ("AMD", "0000002488", "Advanced Micro Devices"),
    ("CRM", "0001108524", "Salesforce Inc."),
    ("EQIX", "0001101239", "Equinix Inc."),
    ("IRM", "0001020569", "Iron Mountain Inc."),
    ("UBER", "0001543151", "Uber Technologies Inc."),
    ("SPOT", "0001639920", "Spotify Technology S.A."),
    ("PYPL", "0001633917", "PayPal Holdings Inc."),
    ("DIS", "0001001039", "Walt Disney Company"),
    ("KO", "0000021344", "Coca-Cola Company"),
    ("PEP", "0000077476", "PepsiCo Inc."),
    ("WMT", "0000104169", "Walmart Inc."),
    ("JPM", "0000019617", "JPMorgan Chase & Co."),
    ("BAC", "0000070858", "Bank of America Corporation"),
    ("V", "0001403161", "Visa Inc."),
    ("MA", "0001141391", "Mastercard Incorporated"),
];

/// Matches a query against the built-in fallback table (exact ticker only).
pub fn match_static_table(query: &str) -> Option<Company> {
    let term = query.trim().to_uppercase();
    WELL_KNOWN_TICKERS
        .iter()
        .find(|(ticker, _, _)| *ticker == term)
        .map(|(ticker, cik, title)| Company {
            ticker: (*ticker).to_string(),
            display_name: (*title).to_string(),
            source: SourceKind::Regulatory,
            regulatory_id: Some((*cik).to_string()),
            sector: None,
            industry: None,
        })
}

/// Reverse lookup: finds the company a zero-padded identifier belongs to.
pub fn company_for_cik(companies: &[CompanyTicker], cik: &str) -> Result<Company> {
    let normalized = cik.trim();
    let wanted: u64 = normalized
        .parse()
        .map_err(|_| ExtractError::InvalidParameter(format!("Invalid CIK: {}", normalized)))?;

    companies
        .iter()
        .find(|row| row.cik == wanted)
        .map(|row| Company {
            ticker: row.ticker.to_uppercase(),
            display_name: row.title.clone(),
            source: SourceKind::Regulatory,
            regulatory_id: Some(zero_pad_cik(row.cik)),
            sector: None,
            industry: None,
        })
        .ok_or_else(|| ExtractError::CompanyNotFound(format!("CIK {}", normalized)))
}
