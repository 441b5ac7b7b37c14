//! Artifact kinds, report URL construction, and the filename policy.
//!
//! Given a resolved company and a reporting period, everything here is pure
//! string work: the same inputs always produce the same URLs and the same
//! local filenames. The registry's financial report renderer publishes one
//! spreadsheet plus numbered HTML fragments per filing; the fragment numbers
//! (R2/R3/R4/R6/R7) are a renderer convention rather than a documented
//! contract, so a 404 on one of them is treated as a per-artifact miss by the
//! download layer, never as a batch failure.

use chrono::NaiveDate;

use super::catalog::{CalendarPeriod, ReportingPeriod};
use super::error::{ExtractError, Result};

/// Artifacts published by the regulatory filing renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilingArtifact {
    /// The full financial report workbook.
    SpreadsheetReport,
    IncomeStatement,
    BalanceSheet,
    BalanceSheetParenthetical,
    CashFlowStatement,
    StockholderEquity,
}

impl FilingArtifact {
    /// All filing artifacts, in the order they are offered for download.
    pub const ALL: [FilingArtifact; 6] = [
        FilingArtifact::SpreadsheetReport,
        FilingArtifact::IncomeStatement,
        FilingArtifact::BalanceSheet,
        FilingArtifact::BalanceSheetParenthetical,
        FilingArtifact::CashFlowStatement,
        FilingArtifact::StockholderEquity,
    ];

    /// File name on the archives host for this artifact.
    ///
    /// The `R*` fragment numbers are the renderer's usual assignments. They
    /// are not guaranteed stable across all filers and years.
    pub fn remote_file(&self) -> &'static str {
        match self {
            FilingArtifact::SpreadsheetReport => "Financial_Report.xlsx",
            FilingArtifact::IncomeStatement => "R4.htm",
            FilingArtifact::BalanceSheet => "R2.htm",
            FilingArtifact::BalanceSheetParenthetical => "R3.htm",
            FilingArtifact::CashFlowStatement => "R7.htm",
            FilingArtifact::StockholderEquity => "R6.htm",
        }
    }

    /// Readable base used in local filenames.
    pub fn readable_name(&self) -> &'static str {
        match self {
            FilingArtifact::SpreadsheetReport => "Financial_Report",
            FilingArtifact::IncomeStatement => "Income_Statement",
            FilingArtifact::BalanceSheet => "Balance_Sheet",
            FilingArtifact::BalanceSheetParenthetical => "Balance_Sheet_Parenthetical",
            FilingArtifact::CashFlowStatement => "Cash_Flow_Statement",
            FilingArtifact::StockholderEquity => "Stockholder_Equity",
        }
    }

    /// Display label for selection lists and progress output.
    pub fn label(&self) -> &'static str {
        match self {
            FilingArtifact::SpreadsheetReport => "Excel Financial Report",
            FilingArtifact::IncomeStatement => "Income Statement (HTML)",
            FilingArtifact::BalanceSheet => "Balance Sheet (HTML)",
            FilingArtifact::BalanceSheetParenthetical => "Balance Sheet Parenthetical (HTML)",
            FilingArtifact::CashFlowStatement => "Cash Flow Statement (HTML)",
            FilingArtifact::StockholderEquity => "Stockholder Equity (HTML)",
        }
    }
}

/// Artifacts derivable from the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketArtifact {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    CompanyInfo,
    HistoricalPrices,
}

impl MarketArtifact {
    /// All market artifacts, in the order they are offered for download.
    pub const ALL: [MarketArtifact; 5] = [
        MarketArtifact::IncomeStatement,
        MarketArtifact::BalanceSheet,
        MarketArtifact::CashFlow,
        MarketArtifact::CompanyInfo,
        MarketArtifact::HistoricalPrices,
    ];

    /// Readable base used in local filenames.
    pub fn readable_name(&self) -> &'static str {
        match self {
            MarketArtifact::IncomeStatement => "Income_Statement",
            MarketArtifact::BalanceSheet => "Balance_Sheet",
            MarketArtifact::CashFlow => "Cash_Flow",
            MarketArtifact::CompanyInfo => "Company_Info",
            MarketArtifact::HistoricalPrices => "Historical_Prices",
        }
    }

    /// Display label for selection lists and progress output.
    pub fn label(&self) -> &'static str {
        match self {
            MarketArtifact::IncomeStatement => "Income Statement",
            MarketArtifact::BalanceSheet => "Balance Sheet",
            MarketArtifact::CashFlow => "Cash Flow",
            MarketArtifact::CompanyInfo => "Company Info",
            MarketArtifact::HistoricalPrices => "Historical Prices",
        }
    }
}

/// An artifact kind from either source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Filing(FilingArtifact),
    Market(MarketArtifact),
}

impl ArtifactKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::Filing(a) => a.label(),
            ArtifactKind::Market(a) => a.label(),
        }
    }
}

/// Where an artifact's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// A downloadable URL on the archives host.
    Remote(String),
    /// A tabular payload derived from the market-data provider at fetch time.
    Derived,
}

/// One downloadable artifact for a specific reporting period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    pub kind: ArtifactKind,
    pub location: ArtifactLocation,
}

/// Builds the full URL set for one filed submission.
///
/// The accession number has its dashes stripped to form the directory name:
/// `{archives_url}/data/{regulatory_id}/{accession_no_dashes}/{file}`.
/// Pure and deterministic: the same inputs yield byte-identical URLs.
pub fn report_urls(
    archives_url: &str,
    regulatory_id: &str,
    accession: &str,
) -> Vec<(FilingArtifact, String)> {
    let clean_accession = accession.replace('-', "");
    let base = format!(
        "{}/data/{}/{}",
        archives_url.trim_end_matches('/'),
        regulatory_id,
        clean_accession
    );

    FilingArtifact::ALL
        .iter()
        .map(|artifact| (*artifact, format!("{}/{}", base, artifact.remote_file())))
        .collect()
}

/// Derives the safe local filename for a downloaded filing artifact.
///
/// The name is keyed by reporting period, not filing event:
/// `{TICKER}-{base}-{report_end_date as YYYYMMDD}{ext}`. The filing date is
/// accepted but deliberately unused, so a re-filed or amended document for
/// the same period collides with the original and the last write wins.
pub fn safe_filename(
    url: &str,
    _filing_date: NaiveDate,
    report_end_date: NaiveDate,
    kind: FilingArtifact,
    ticker: &str,
) -> String {
    let (base_name, ext) = if url.contains("Financial_Report.xlsx") {
        ("Financial_Report", ".xlsx")
    } else if url.ends_with(".htm") {
        (kind.readable_name(), ".htm")
    } else {
        ("Financial_Report", ".html")
    };

    format!(
        "{}-{}-{}{}",
        ticker.to_uppercase(),
        base_name,
        report_end_date.format("%Y%m%d"),
        ext
    )
}

/// Characters that are unsafe in filenames across platforms.
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replaces filesystem-unsafe characters in a sheet name with underscores.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Filename for a CSV exported from one workbook sheet:
/// `{TICKER}-{sanitized_sheet}-{YYYYMMDD}.csv`.
pub fn sheet_csv_filename(ticker: &str, sheet_name: &str, report_end_date: NaiveDate) -> String {
    format!(
        "{}-{}-{}.csv",
        ticker.to_uppercase(),
        sanitize_sheet_name(sheet_name),
        report_end_date.format("%Y%m%d")
    )
}

/// Filename for a market-data artifact:
/// `{TICKER}-{base}-{Q{q}_{year}|Annual_{year}}.csv`.
pub fn market_filename(ticker: &str, artifact: MarketArtifact, period: &CalendarPeriod) -> String {
    format!(
        "{}-{}-{}.csv",
        ticker.to_uppercase(),
        artifact.readable_name(),
        period.suffix()
    )
}

/// Derives the local filename for any (period, artifact) pair.
///
/// Filing artifacts require a filed period (the report end date is part of
/// the name); market artifacts require a calendar period. Mixing the
/// families is a caller bug and reported as an invalid parameter.
pub fn artifact_filename(
    ticker: &str,
    period: &ReportingPeriod,
    descriptor: &ArtifactDescriptor,
) -> Result<String> {
    match (&descriptor.kind, period) {
        (ArtifactKind::Filing(kind), ReportingPeriod::Filing(filing)) => {
            let url = match &descriptor.location {
                ArtifactLocation::Remote(url) => url.clone(),
                ArtifactLocation::Derived => {
                    return Err(ExtractError::InvalidParameter(
                        "Filing artifacts must have a remote location".to_string(),
                    ));
                }
            };
            Ok(safe_filename(
                &url,
                filing.filing_date,
                filing.report_end_date,
                *kind,
                ticker,
            ))
        }
        (ArtifactKind::Market(kind), ReportingPeriod::Calendar(calendar)) => {
            Ok(market_filename(ticker, *kind, calendar))
        }
        _ => Err(ExtractError::InvalidParameter(format!(
            "Artifact {} does not belong to period {}",
            descriptor.kind.label(),
            period.label()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilingPeriod;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_urls_strip_dashes() {
        let urls = report_urls(
            "https://www.sec.gov/Archives/edgar",
            "0000320193",
            "0000320193-24-000123",
        );
        let (kind, spreadsheet) = &urls[0];
        assert_eq!(*kind, FilingArtifact::SpreadsheetReport);
        assert!(spreadsheet.ends_with("/000032019324000123/Financial_Report.xlsx"));
        assert!(spreadsheet.contains("/data/0000320193/"));
    }

    #[test]
    fn test_report_urls_deterministic() {
        let a = report_urls("https://www.sec.gov/Archives/edgar", "0000320193", "0000320193-24-000123");
        let b = report_urls("https://www.sec.gov/Archives/edgar", "0000320193", "0000320193-24-000123");
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn test_fragment_mapping() {
        let urls = report_urls("https://www.sec.gov/Archives/edgar", "320193", "0-0-0");
        let find = |kind: FilingArtifact| {
            urls.iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, url)| url.rsplit('/').next().unwrap().to_string())
                .unwrap()
        };
        assert_eq!(find(FilingArtifact::IncomeStatement), "R4.htm");
        assert_eq!(find(FilingArtifact::BalanceSheet), "R2.htm");
        assert_eq!(find(FilingArtifact::BalanceSheetParenthetical), "R3.htm");
        assert_eq!(find(FilingArtifact::CashFlowStatement), "R7.htm");
        assert_eq!(find(FilingArtifact::StockholderEquity), "R6.htm");
    }

    #[test]
    fn test_safe_filename_spreadsheet() {
        let name = safe_filename(
            "https://example.test/000032019324000123/Financial_Report.xlsx",
            date(2024, 11, 1),
            date(2024, 9, 28),
            FilingArtifact::SpreadsheetReport,
            "aapl",
        );
        assert_eq!(name, "AAPL-Financial_Report-20240928.xlsx");
    }

    #[test]
    fn test_safe_filename_html_fragment() {
        let name = safe_filename(
            "https://example.test/000032019324000123/R4.htm",
            date(2024, 11, 1),
            date(2024, 9, 28),
            FilingArtifact::IncomeStatement,
            "AAPL",
        );
        assert_eq!(name, "AAPL-Income_Statement-20240928.htm");
    }

    #[test]
    fn test_safe_filename_fallback_extension() {
        let name = safe_filename(
            "https://example.test/some/other/document",
            date(2024, 11, 1),
            date(2024, 9, 28),
            FilingArtifact::IncomeStatement,
            "AAPL",
        );
        assert!(name.ends_with(".html"));
        assert!(name.contains("Financial_Report"));
    }

    #[test]
    fn test_filing_date_excluded_from_identity() {
        let a = safe_filename(
            "https://example.test/x/R2.htm",
            date(2024, 11, 1),
            date(2024, 9, 28),
            FilingArtifact::BalanceSheet,
            "AAPL",
        );
        let b = safe_filename(
            "https://example.test/x/R2.htm",
            date(2025, 2, 14),
            date(2024, 9, 28),
            FilingArtifact::BalanceSheet,
            "AAPL",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_filenames_never_contain_unsafe_chars() {
        for kind in FilingArtifact::ALL {
            let url = format!("https://example.test/x/{}", kind.remote_file());
            let name = safe_filename(&url, date(2024, 1, 2), date(2023, 12, 30), kind, "msft");
            assert!(
                !name.contains(UNSAFE_FILENAME_CHARS),
                "unsafe char in {}",
                name
            );
            assert!(
                [".xlsx", ".htm", ".html", ".csv"]
                    .iter()
                    .any(|ext| name.ends_with(ext)),
                "unexpected extension in {}",
                name
            );
        }
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(
            sanitize_sheet_name("Consolidated Balance Sheets"),
            "Consolidated Balance Sheets"
        );
        assert_eq!(sanitize_sheet_name(r#"Q1 <A/B>: "cash"?"#), "Q1 _A_B__ _cash__");
    }

    #[test]
    fn test_sheet_csv_filename() {
        let name = sheet_csv_filename("aapl", "Consolidated Ops/Income", date(2024, 9, 28));
        assert_eq!(name, "AAPL-Consolidated Ops_Income-20240928.csv");
    }

    #[test]
    fn test_artifact_filename_rejects_mixed_families() {
        let calendar = ReportingPeriod::Calendar(CalendarPeriod {
            year: 2024,
            quarter: Some(1),
        });
        let filing_artifact = ArtifactDescriptor {
            kind: ArtifactKind::Filing(FilingArtifact::BalanceSheet),
            location: ArtifactLocation::Remote("https://example.test/R2.htm".to_string()),
        };
        assert!(artifact_filename("AAPL", &calendar, &filing_artifact).is_err());

        let filing = ReportingPeriod::Filing(FilingPeriod {
            form: "10-Q".to_string(),
            filing_date: date(2024, 8, 2),
            report_end_date: date(2024, 6, 29),
            accession: "0000320193-24-000081".to_string(),
        });
        let name = artifact_filename("AAPL", &filing, &filing_artifact).unwrap();
        assert_eq!(name, "AAPL-Balance_Sheet-20240629.htm");
    }

    #[test]
    fn test_market_filename() {
        let quarterly = CalendarPeriod {
            year: 2024,
            quarter: Some(2),
        };
        assert_eq!(
            market_filename("eqix", MarketArtifact::BalanceSheet, &quarterly),
            "EQIX-Balance_Sheet-Q2_2024.csv"
        );
        let annual = CalendarPeriod {
            year: 2023,
            quarter: None,
        };
        assert_eq!(
            market_filename("EQIX", MarketArtifact::HistoricalPrices, &annual),
            "EQIX-Historical_Prices-Annual_2023.csv"
        );
    }
}
