mod common;

use common::read_fixture;
use reportkit::{FormType, ReportingPeriod, SubmissionsIndex, filing_periods};

#[test]
fn parse_submissions_index() {
    let content = read_fixture("submissions/submission.json");
    let index: SubmissionsIndex = serde_json::from_str(&content).unwrap();

    assert_eq!(index.name, "Apple Inc.");
    assert_eq!(index.cik, "0000320193");
    assert_eq!(index.tickers, vec!["AAPL"]);
    assert_eq!(index.filings.recent.form.len(), 6);
}

#[test]
fn quarterly_periods_filter_and_order() {
    let content = read_fixture("submissions/submission.json");
    let index: SubmissionsIndex = serde_json::from_str(&content).unwrap();

    let periods = filing_periods(&index.filings.recent, FormType::QuarterlyReport, 10);
    assert_eq!(periods.len(), 3);

    // Source order is most-recent-first and must be preserved.
    let ends: Vec<String> = periods
        .iter()
        .map(|p| match p {
            ReportingPeriod::Filing(f) => f.report_end_date.to_string(),
            other => panic!("unexpected period {:?}", other),
        })
        .collect();
    assert_eq!(ends, vec!["2024-06-29", "2024-03-30", "2023-12-30"]);
}

#[test]
fn annual_periods_with_limit() {
    let content = read_fixture("submissions/submission.json");
    let index: SubmissionsIndex = serde_json::from_str(&content).unwrap();

    let periods = filing_periods(&index.filings.recent, FormType::AnnualReport, 1);
    assert_eq!(periods.len(), 1);
    match &periods[0] {
        ReportingPeriod::Filing(f) => {
            assert_eq!(f.accession, "0000320193-24-000123");
            assert_eq!(f.filing_date.to_string(), "2024-11-01");
        }
        other => panic!("unexpected period {:?}", other),
    }
}

#[test]
fn current_reports_come_from_their_own_form() {
    let content = read_fixture("submissions/submission.json");
    let index: SubmissionsIndex = serde_json::from_str(&content).unwrap();

    let periods = filing_periods(&index.filings.recent, FormType::CurrentReport, 10);
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].folder_component(), "8-K");
    assert_eq!(periods[0].year(), 2024);
}
