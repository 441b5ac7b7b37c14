//! Reporting periods: filed submissions and synthesized calendar periods.
//!
//! The regulatory registry delivers a company's filing history as parallel
//! arrays inside the submissions index; the market-data provider has no
//! notion of filings at all, so its periods are synthesized from the
//! calendar. Both collapse into [`ReportingPeriod`], which is what the rest
//! of the pipeline (naming, layout, fetching) keys on.

use chrono::NaiveDate;
use serde::Deserialize;

use super::error::{ExtractError, Result};

/// Filing categories the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    /// Quarterly report (`10-Q`).
    QuarterlyReport,
    /// Annual report (`10-K`).
    AnnualReport,
    /// Current report (`8-K`).
    CurrentReport,
}

impl FormType {
    /// The exact form string the registry uses; filtering is by exact match.
    pub fn registry_form(&self) -> &'static str {
        match self {
            FormType::QuarterlyReport => "10-Q",
            FormType::AnnualReport => "10-K",
            FormType::CurrentReport => "8-K",
        }
    }

    /// Folder component used for market-data layouts.
    pub fn period_folder(&self) -> &'static str {
        match self {
            FormType::QuarterlyReport => "QUARTERLY",
            FormType::AnnualReport => "ANNUAL",
            FormType::CurrentReport => "CURRENT",
        }
    }

    pub fn is_quarterly(&self) -> bool {
        matches!(self, FormType::QuarterlyReport)
    }
}

/// One filed regulatory submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingPeriod {
    /// Registry form string, e.g. `10-Q`.
    pub form: String,
    /// Date the submission was filed.
    pub filing_date: NaiveDate,
    /// Fiscal period end the filing covers. This, not the filing date, is
    /// the stable identity of the period.
    pub report_end_date: NaiveDate,
    /// Accession number in `NNNNNNNNNN-NN-NNNNNN` form.
    pub accession: String,
}

/// A synthesized calendar period for the market-data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarPeriod {
    pub year: i32,
    /// `Some(1..=4)` for a quarter, `None` for a full year.
    pub quarter: Option<u8>,
}

impl CalendarPeriod {
    /// Inclusive start/end dates the period spans.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidParameter` when the quarter is outside
    /// `1..=4` or the year produces no valid calendar dates.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let invalid =
            || ExtractError::InvalidParameter(format!("Invalid calendar period: {:?}", self));
        match self.quarter {
            Some(q) => {
                if !(1..=4).contains(&q) {
                    return Err(invalid());
                }
                let start_month = (u32::from(q) - 1) * 3 + 1;
                let end_month = u32::from(q) * 3;
                let end_day = match end_month {
                    6 | 9 => 30,
                    _ => 31,
                };
                Ok((
                    NaiveDate::from_ymd_opt(self.year, start_month, 1).ok_or_else(invalid)?,
                    NaiveDate::from_ymd_opt(self.year, end_month, end_day).ok_or_else(invalid)?,
                ))
            }
            None => Ok((
                NaiveDate::from_ymd_opt(self.year, 1, 1).ok_or_else(invalid)?,
                NaiveDate::from_ymd_opt(self.year, 12, 31).ok_or_else(invalid)?,
            )),
        }
    }

    /// Filename suffix identifying the period, e.g. `Q2_2024` or `Annual_2023`.
    pub fn suffix(&self) -> String {
        match self.quarter {
            Some(q) => format!("Q{}_{}", q, self.year),
            None => format!("Annual_{}", self.year),
        }
    }
}

/// A period artifacts can be extracted for, from either source.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportingPeriod {
    Filing(FilingPeriod),
    Calendar(CalendarPeriod),
}

impl ReportingPeriod {
    /// Year used for the `{ticker}/{form}/{year}/` folder layout.
    pub fn year(&self) -> i32 {
        match self {
            ReportingPeriod::Filing(f) => {
                use chrono::Datelike;
                f.report_end_date.year()
            }
            ReportingPeriod::Calendar(c) => c.year,
        }
    }

    /// Second folder component: the form string for filings, the period type
    /// for calendar periods.
    pub fn folder_component(&self) -> String {
        match self {
            ReportingPeriod::Filing(f) => f.form.clone(),
            ReportingPeriod::Calendar(c) => match c.quarter {
                Some(_) => "QUARTERLY".to_string(),
                None => "ANNUAL".to_string(),
            },
        }
    }

    /// One-line description for progress output and failure records.
    pub fn label(&self) -> String {
        match self {
            ReportingPeriod::Filing(f) => format!(
                "{} - Filing: {} | Report: {}",
                f.form, f.filing_date, f.report_end_date
            ),
            ReportingPeriod::Calendar(c) => match c.quarter {
                Some(q) => format!("Q{} {}", q, c.year),
                None => format!("Annual {}", c.year),
            },
        }
    }
}

/// The slice of the submissions index this pipeline consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsIndex {
    pub cik: String,
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    pub filings: FilingHistory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingHistory {
    pub recent: RecentFilings,
}

/// The registry's parallel-array representation of recent filings. Index `i`
/// across all arrays describes one submission.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentFilings {
    #[serde(rename = "accessionNumber")]
    pub accession_number: Vec<String>,
    #[serde(rename = "filingDate")]
    pub filing_date: Vec<String>,
    #[serde(rename = "reportDate")]
    pub report_date: Option<Vec<String>>,
    pub form: Vec<String>,
}

/// Filters the recent-filings arrays down to periods of one form type.
///
/// Source order (most-recent-first) is preserved and the result is truncated
/// to `limit`. Rows without a parsable report date are skipped with a
/// warning: the filename policy keys every artifact on the report end date,
/// so such rows cannot be used downstream.
pub fn filing_periods(
    recent: &RecentFilings,
    form: FormType,
    limit: usize,
) -> Vec<ReportingPeriod> {
    let wanted = form.registry_form();
    let mut periods = Vec::new();

    for idx in 0..recent.form.len() {
        if periods.len() >= limit {
            break;
        }
        if recent.form[idx].trim() != wanted {
            continue;
        }

        let accession = match recent.accession_number.get(idx) {
            Some(a) if !a.is_empty() => a.clone(),
            _ => continue,
        };
        let filing_date = recent
            .filing_date
            .get(idx)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let report_end_date = recent
            .report_date
            .as_ref()
            .and_then(|dates| dates.get(idx))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        match (filing_date, report_end_date) {
            (Some(filing_date), Some(report_end_date)) => {
                periods.push(ReportingPeriod::Filing(FilingPeriod {
                    form: wanted.to_string(),
                    filing_date,
                    report_end_date,
                    accession,
                }));
            }
            _ => {
                tracing::warn!(
                    accession = %accession,
                    "skipping filing without a usable filing/report date"
                );
            }
        }
    }

    periods
}

/// How many calendar years back the synthesized quarterly catalog reaches.
const QUARTERLY_YEARS: i32 = 5;
/// How many calendar years back the synthesized annual catalog reaches.
const ANNUAL_YEARS: i32 = 10;

/// Synthesizes calendar periods for the market-data source.
///
/// Quarterly requests cross the last five calendar years with quarters 1–4
/// (descending year, ascending quarter); annual requests produce the last ten
/// years descending. Availability is not verified here; a later fetch that
/// comes back empty is a data-layer miss, not a catalog error.
pub fn calendar_periods(latest_year: i32, form: FormType) -> Result<Vec<CalendarPeriod>> {
    match form {
        FormType::QuarterlyReport => {
            let mut periods = Vec::with_capacity((QUARTERLY_YEARS * 4) as usize);
            for offset in 0..QUARTERLY_YEARS {
                let year = latest_year - offset;
                for quarter in 1..=4u8 {
                    periods.push(CalendarPeriod {
                        year,
                        quarter: Some(quarter),
                    });
                }
            }
            Ok(periods)
        }
        FormType::AnnualReport => Ok((0..ANNUAL_YEARS)
            .map(|offset| CalendarPeriod {
                year: latest_year - offset,
                quarter: None,
            })
            .collect()),
        FormType::CurrentReport => Err(ExtractError::InvalidParameter(
            "Current reports are not available from the market-data source".to_string(),
        )),
    }
}
