mod common;

use common::read_fixture;
use std::time::Duration;

use reportkit::{
    ArtifactKind, Company, DataSource, ExtractError, ExtractorConfig, FilingArtifact, FormType,
    RegistryUrls, RegulatoryFilingSource, SourceKind,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(uri: &str) -> ExtractorConfig {
    ExtractorConfig {
        user_agent: "test_agent example@example.com".to_string(),
        rate_limit: 100,
        timeout: Duration::from_secs(5),
        base_urls: RegistryUrls {
            archives: format!("{}/Archives/edgar", uri),
            data: uri.to_string(),
            files: format!("{}/files", uri),
        },
        render_api: None,
    }
}

fn aapl() -> Company {
    Company {
        ticker: "AAPL".to_string(),
        display_name: "Apple Inc.".to_string(),
        source: SourceKind::Regulatory,
        regulatory_id: Some("0000320193".to_string()),
        sector: None,
        industry: None,
    }
}

async fn mount_primary_directory(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/files/company_tickers.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(read_fixture("tickers/company_tickers.json")),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn resolve_against_primary_directory() {
    let server = MockServer::start().await;
    mount_primary_directory(&server).await;

    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let company = source.resolve("AAPL").await.unwrap();

    assert_eq!(company.regulatory_id.as_deref(), Some("0000320193"));
    assert_eq!(company.source, SourceKind::Regulatory);
}

#[tokio::test]
async fn resolve_falls_back_to_exchange_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/company_tickers.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/company_tickers_exchange.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(read_fixture("tickers/company_tickers_exchange.json")),
        )
        .mount(&server)
        .await;

    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let company = source.resolve("TSLA").await.unwrap();

    assert_eq!(company.display_name, "Tesla, Inc.");
    assert_eq!(company.regulatory_id.as_deref(), Some("0001318605"));
}

#[tokio::test]
async fn resolve_falls_back_to_static_table() {
    let server = MockServer::start().await;
    // Both remote directories down; well-known tickers still resolve.
    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let company = source.resolve("NVDA").await.unwrap();

    assert_eq!(company.regulatory_id.as_deref(), Some("0001045810"));
}

#[tokio::test]
async fn resolve_reports_not_found() {
    let server = MockServer::start().await;
    mount_primary_directory(&server).await;

    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let result = source.resolve("ZZZZZT").await;

    assert!(matches!(result, Err(ExtractError::CompanyNotFound(_))));
}

#[tokio::test]
async fn list_periods_from_submissions_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000320193.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(read_fixture("submissions/submission.json")),
        )
        .mount(&server)
        .await;

    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let periods = source
        .list_periods(&aapl(), FormType::QuarterlyReport, 2)
        .await
        .unwrap();

    assert_eq!(periods.len(), 2);
    assert!(periods[0].label().contains("10-Q"));
}

#[tokio::test]
async fn empty_catalog_when_no_filings_match() {
    let server = MockServer::start().await;
    let body = r#"{
        "cik": "0000789019",
        "name": "MICROSOFT CORP",
        "tickers": ["MSFT"],
        "filings": {
            "recent": {
                "accessionNumber": ["0000789019-24-000001"],
                "filingDate": ["2024-01-30"],
                "reportDate": ["2024-01-30"],
                "form": ["8-K"]
            }
        }
    }"#;
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000789019.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let msft = Company {
        ticker: "MSFT".to_string(),
        display_name: "MICROSOFT CORP".to_string(),
        source: SourceKind::Regulatory,
        regulatory_id: Some("0000789019".to_string()),
        sector: None,
        industry: None,
    };
    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let result = source
        .list_periods(&msft, FormType::QuarterlyReport, 5)
        .await;

    assert!(matches!(result, Err(ExtractError::EmptyCatalog { .. })));
}

#[tokio::test]
async fn fetch_artifact_via_direct_strategy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000320193.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(read_fixture("submissions/submission.json")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/Archives/edgar/data/0000320193/000032019324000081/R2.htm",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html>balance</html>".to_vec()))
        .mount(&server)
        .await;

    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();
    let company = aapl();
    let periods = source
        .list_periods(&company, FormType::QuarterlyReport, 1)
        .await
        .unwrap();
    let artifacts = source.build_artifacts(&company, &periods[0]).unwrap();
    let balance_sheet = artifacts
        .iter()
        .find(|d| d.kind == ArtifactKind::Filing(FilingArtifact::BalanceSheet))
        .unwrap();

    let bytes = source.fetch(&company, &periods[0], balance_sheet).await.unwrap();
    assert_eq!(bytes, b"<html>balance</html>");
}

#[tokio::test]
async fn render_strategy_failure_falls_back_to_direct() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/render/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/Archives/edgar/data/0000320193/000032019324000081/R4.htm",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html>income</html>".to_vec()))
        .mount(&server)
        .await;

    let uri = server.uri();
    let config = test_config(&uri).with_render_api(format!("{}/render", uri), "test-key");
    let source = RegulatoryFilingSource::with_config(&config).unwrap();

    let url = format!(
        "{}/Archives/edgar/data/0000320193/000032019324000081/R4.htm",
        uri
    );
    let company = aapl();
    let period = reportkit::ReportingPeriod::Filing(reportkit::FilingPeriod {
        form: "10-Q".to_string(),
        filing_date: chrono::NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
        report_end_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 29).unwrap(),
        accession: "0000320193-24-000081".to_string(),
    });
    let descriptor = reportkit::ArtifactDescriptor {
        kind: ArtifactKind::Filing(FilingArtifact::IncomeStatement),
        location: reportkit::ArtifactLocation::Remote(url),
    };

    let bytes = source.fetch(&company, &period, &descriptor).await.unwrap();
    assert_eq!(bytes, b"<html>income</html>");
}

#[tokio::test]
async fn exhausted_strategies_report_fetch_failure() {
    let server = MockServer::start().await;
    // Nothing mounted: every artifact request 404s.
    let source = RegulatoryFilingSource::with_config(&test_config(&server.uri())).unwrap();

    let company = aapl();
    let period = reportkit::ReportingPeriod::Filing(reportkit::FilingPeriod {
        form: "10-Q".to_string(),
        filing_date: chrono::NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
        report_end_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 29).unwrap(),
        accession: "0000320193-24-000081".to_string(),
    });
    let descriptor = reportkit::ArtifactDescriptor {
        kind: ArtifactKind::Filing(FilingArtifact::SpreadsheetReport),
        location: reportkit::ArtifactLocation::Remote(format!(
            "{}/Archives/edgar/data/0000320193/000032019324000081/Financial_Report.xlsx",
            server.uri()
        )),
    };

    let result = source.fetch(&company, &period, &descriptor).await;
    assert!(matches!(result, Err(ExtractError::FetchFailed { .. })));
}
