//! Batch extraction: fetch every selected (period, artifact) pair and write
//! the results into a folder tree or a ZIP archive.
//!
//! Layout invariant, identical for local disk and in-archive paths:
//! `{ticker}/{form_or_period_type}/{year}/{filename}`. Every pair succeeds or
//! fails on its own; the batch never aborts because one artifact is missing.
//! Name collisions overwrite silently: filenames are keyed by reporting
//! period, so a re-filed document for the same period replaces the original.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::artifacts::{ArtifactDescriptor, ArtifactKind, artifact_filename};
use super::catalog::{FormType, ReportingPeriod};
use super::company::Company;
use super::error::Result;
use super::sources::DataSource;

#[cfg(feature = "sheets")]
use super::artifacts::{FilingArtifact, sheet_csv_filename};
#[cfg(feature = "sheets")]
use super::sheets::{SheetSelection, Workbook, export_sheets, resolve_selection};

/// Everything one user-initiated extraction operates on.
///
/// The session is an immutable value: selections are replaced wholesale when
/// the user changes their mind, never mutated mid-flight, so no pipeline
/// stage observes a half-updated state.
#[derive(Debug, Clone)]
pub struct ExtractionSession {
    pub company: Company,
    pub form: FormType,
    /// Periods the user picked from the catalog.
    pub periods: Vec<ReportingPeriod>,
    /// Artifact kinds to extract per period. Empty means every kind the
    /// source offers.
    pub artifacts: Vec<ArtifactKind>,
}

impl ExtractionSession {
    pub fn new(
        company: Company,
        form: FormType,
        periods: Vec<ReportingPeriod>,
        artifacts: Vec<ArtifactKind>,
    ) -> Self {
        Self {
            company,
            form,
            periods,
            artifacts,
        }
    }

    fn wants(&self, kind: &ArtifactKind) -> bool {
        self.artifacts.is_empty() || self.artifacts.contains(kind)
    }
}

/// Where extracted artifacts go.
#[derive(Debug, Clone)]
pub enum Destination {
    /// A directory tree on local disk; nested folders are created as needed.
    LocalFolder(PathBuf),
    /// A single ZIP archive; artifacts are buffered in memory and written
    /// straight into the archive, with no temp-directory staging.
    #[cfg(feature = "archive")]
    ZipArchive(PathBuf),
}

/// Tuning knobs for a batch run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Fixed pause between artifact downloads. A politeness heuristic for
    /// the registry, not derived from any published limit.
    pub pause: Duration,
    /// Sheet-export policy applied to downloaded spreadsheet reports.
    #[cfg(feature = "sheets")]
    pub sheet_selection: SheetSelection,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(1),
            #[cfg(feature = "sheets")]
            sheet_selection: SheetSelection::Auto,
        }
    }
}

/// One pair that could not be extracted.
#[derive(Debug, Clone)]
pub struct ExtractFailure {
    pub period: String,
    pub artifact: String,
    pub reason: String,
}

/// Outcome of a batch run: what was written, what was not.
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    /// Relative paths (layout convention above) of everything written,
    /// in write order.
    pub written: Vec<String>,
    pub failures: Vec<ExtractFailure>,
}

impl ExtractReport {
    pub fn success_count(&self) -> usize {
        self.written.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, period: &ReportingPeriod, artifact: &str, reason: impl ToString) {
        let failure = ExtractFailure {
            period: period.label(),
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        };
        tracing::warn!(
            period = %failure.period,
            artifact = %failure.artifact,
            reason = %failure.reason,
            "artifact skipped"
        );
        self.failures.push(failure);
    }
}

/// Name for a fresh extraction archive:
/// `{TICKER}_financial_data_{YYYYMMDD_HHMMSS}.zip`.
pub fn archive_file_name(ticker: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_financial_data_{}.zip",
        ticker.to_uppercase(),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

enum Sink {
    Local { root: PathBuf },
    #[cfg(feature = "archive")]
    Zip { writer: zip::ZipWriter<std::fs::File> },
}

impl Sink {
    fn open(destination: &Destination) -> Result<Self> {
        match destination {
            Destination::LocalFolder(root) => {
                std::fs::create_dir_all(root)?;
                Ok(Sink::Local { root: root.clone() })
            }
            #[cfg(feature = "archive")]
            Destination::ZipArchive(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let file = std::fs::File::create(path)?;
                Ok(Sink::Zip {
                    writer: zip::ZipWriter::new(file),
                })
            }
        }
    }

    fn write(&mut self, relative: &str, bytes: &[u8]) -> Result<()> {
        match self {
            Sink::Local { root } => {
                let path = root.join(Path::new(relative));
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, bytes)?;
                Ok(())
            }
            #[cfg(feature = "archive")]
            Sink::Zip { writer } => {
                use std::io::Write;
                let options = zip::write::SimpleFileOptions::default()
                    .compression_method(zip::CompressionMethod::Deflated);
                writer.start_file(relative, options)?;
                writer.write_all(bytes)?;
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<()> {
        match self {
            Sink::Local { .. } => Ok(()),
            #[cfg(feature = "archive")]
            Sink::Zip { mut writer } => {
                writer.finish()?;
                Ok(())
            }
        }
    }
}

fn relative_path(ticker: &str, period: &ReportingPeriod, filename: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        ticker.to_uppercase(),
        period.folder_component(),
        period.year(),
        filename
    )
}

/// Runs one extraction batch.
///
/// Each (period × artifact) pair resolves, fetches, and writes on its own;
/// failures become report entries and the loop moves on. The returned error
/// covers only conditions outside any single pair, such as an unopenable
/// destination. Output already written stays on disk in that case.
pub async fn extract(
    source: &dyn DataSource,
    session: &ExtractionSession,
    destination: &Destination,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut sink = Sink::open(destination)?;
    let mut report = ExtractReport::default();

    for period in &session.periods {
        let descriptors = match source.build_artifacts(&session.company, period) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                report.record_failure(period, "all artifacts", err);
                continue;
            }
        };

        for descriptor in descriptors
            .into_iter()
            .filter(|d| session.wants(&d.kind))
        {
            let label = descriptor.kind.label();
            tracing::info!(period = %period.label(), artifact = label, "downloading");

            match source.fetch(&session.company, period, &descriptor).await {
                Ok(bytes) => {
                    write_artifact(
                        &mut sink,
                        &mut report,
                        session,
                        period,
                        &descriptor,
                        &bytes,
                        options,
                    );
                }
                Err(err) => report.record_failure(period, label, err),
            }

            if !options.pause.is_zero() {
                tokio::time::sleep(options.pause).await;
            }
        }
    }

    sink.finish()?;
    tracing::info!(
        written = report.success_count(),
        failed = report.failure_count(),
        "extraction finished"
    );
    Ok(report)
}

fn write_artifact(
    sink: &mut Sink,
    report: &mut ExtractReport,
    session: &ExtractionSession,
    period: &ReportingPeriod,
    descriptor: &ArtifactDescriptor,
    bytes: &[u8],
    options: &ExtractOptions,
) {
    let ticker = &session.company.ticker;
    let label = descriptor.kind.label();

    let filename = match artifact_filename(ticker, period, descriptor) {
        Ok(filename) => filename,
        Err(err) => {
            report.record_failure(period, label, err);
            return;
        }
    };

    let relative = relative_path(ticker, period, &filename);
    match sink.write(&relative, bytes) {
        Ok(()) => {
            tracing::info!(path = %relative, "written");
            report.written.push(relative);
        }
        Err(err) => {
            report.record_failure(period, label, err);
            return;
        }
    }

    #[cfg(feature = "sheets")]
    if descriptor.kind == ArtifactKind::Filing(FilingArtifact::SpreadsheetReport) {
        export_spreadsheet_sheets(sink, report, session, period, bytes, options);
    }

    #[cfg(not(feature = "sheets"))]
    let _ = options;
}

/// Exports auto-selected workbook sheets next to the spreadsheet itself.
/// Analysis failure or an empty selection degrades to "no export"; the
/// spreadsheet artifact has already been written either way.
#[cfg(feature = "sheets")]
fn export_spreadsheet_sheets(
    sink: &mut Sink,
    report: &mut ExtractReport,
    session: &ExtractionSession,
    period: &ReportingPeriod,
    bytes: &[u8],
    options: &ExtractOptions,
) {
    let ReportingPeriod::Filing(filing) = period else {
        return;
    };
    let ticker = &session.company.ticker;

    let workbook = match Workbook::parse(bytes) {
        Ok(workbook) => workbook,
        Err(err) => {
            tracing::warn!(error = %err, "workbook analysis failed; no sheets exported");
            return;
        }
    };

    let summaries = workbook.summaries();
    let selected = resolve_selection(&summaries, &options.sheet_selection);
    if selected.is_empty() {
        tracing::info!(period = %period.label(), "could not auto-select sheets; no CSV export");
        return;
    }

    for (sheet_name, csv_bytes) in export_sheets(&workbook, &selected) {
        let filename = sheet_csv_filename(ticker, &sheet_name, filing.report_end_date);
        let relative = relative_path(ticker, period, &filename);
        match sink.write(&relative, &csv_bytes) {
            Ok(()) => {
                tracing::info!(path = %relative, "sheet exported");
                report.written.push(relative);
            }
            Err(err) => {
                report.record_failure(period, &format!("sheet '{}'", sheet_name), err);
            }
        }
    }
}
