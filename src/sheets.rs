//! Workbook sheet analysis and CSV export.
//!
//! The registry's rendered financial report is an OOXML spreadsheet, a ZIP
//! of XML parts. This module reads exactly the parts the pipeline needs (the
//! sheet list, relationships, shared strings, and cell grids) and classifies
//! sheets by name so the consolidated statements can be exported as CSV
//! without user interaction. It is deliberately not a general spreadsheet
//! engine: formulas, styles, and charts are ignored.
//!
//! Classification is purely lexical. A sheet is "consolidated" when its name
//! contains `consolidated`, and a "financial statement" when it contains any
//! of `income`, `balance`, `cash`, or `statement`, all case-insensitive.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Cursor, Read};

use super::error::{ExtractError, Result};

/// Name-derived classification of one workbook sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetClassification {
    pub is_consolidated: bool,
    pub is_financial_statement: bool,
}

/// Terms that mark a sheet as a financial statement.
const STATEMENT_TERMS: &[&str] = &["income", "balance", "cash", "statement"];

/// Classifies a sheet by name alone.
pub fn classify(sheet_name: &str) -> SheetClassification {
    let lower = sheet_name.to_lowercase();
    SheetClassification {
        is_consolidated: lower.contains("consolidated"),
        is_financial_statement: STATEMENT_TERMS.iter().any(|term| lower.contains(term)),
    }
}

/// What a caller learns about a sheet before deciding to export it.
#[derive(Debug, Clone)]
pub struct SheetSummary {
    pub name: String,
    /// First-row cells, as a column preview.
    pub columns: Vec<String>,
    pub classification: SheetClassification,
}

/// One parsed sheet: its name and cell grid as strings.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// A parsed workbook, sheets in workbook order.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Parses workbook bytes.
    ///
    /// A sheet part that is missing or unreadable is logged and kept with an
    /// empty grid so the sheet list stays complete; a workbook that cannot be
    /// opened at all is an `AnalysisFailed` error, which callers degrade to
    /// "no auto-export" rather than treating as fatal.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::AnalysisFailed(format!("not a workbook archive: {}", e)))?;

        let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?.ok_or_else(|| {
            ExtractError::AnalysisFailed("workbook archive has no xl/workbook.xml".to_string())
        })?;
        let sheet_refs = parse_workbook_sheets(&workbook_xml)?;
        if sheet_refs.is_empty() {
            return Err(ExtractError::AnalysisFailed(
                "workbook declares no sheets".to_string(),
            ));
        }

        let relationships = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        for (position, (name, rel_id)) in sheet_refs.into_iter().enumerate() {
            let part = rel_id
                .as_deref()
                .and_then(|id| relationships.get(id))
                .map(|target| resolve_part_path(target))
                .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));

            let rows = match read_part(&mut archive, &part) {
                Ok(Some(xml)) => match parse_sheet_rows(&xml, &shared_strings) {
                    Ok(rows) => rows,
                    Err(err) => {
                        tracing::warn!(sheet = %name, error = %err, "unreadable sheet part");
                        Vec::new()
                    }
                },
                Ok(None) => {
                    tracing::warn!(sheet = %name, part = %part, "sheet part missing from workbook");
                    Vec::new()
                }
                Err(err) => {
                    tracing::warn!(sheet = %name, error = %err, "unreadable sheet part");
                    Vec::new()
                }
            };

            sheets.push(Sheet { name, rows });
        }

        Ok(Workbook { sheets })
    }

    /// Looks up a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Summaries for every sheet, in workbook order.
    pub fn summaries(&self) -> Vec<SheetSummary> {
        self.sheets
            .iter()
            .map(|sheet| SheetSummary {
                name: sheet.name.clone(),
                columns: sheet.rows.first().cloned().unwrap_or_default(),
                classification: classify(&sheet.name),
            })
            .collect()
    }
}

/// How many financial-statement sheets the fallback rule exports.
const STATEMENT_FALLBACK_LIMIT: usize = 3;

/// Picks the sheets to export without user input.
///
/// Ordered rules; the first that yields a non-empty set wins:
/// 1. every consolidated sheet,
/// 2. the first three financial-statement sheets in sheet order,
/// 3. nothing, reported by the caller as "could not auto-select".
pub fn auto_select(summaries: &[SheetSummary]) -> Vec<String> {
    let consolidated: Vec<String> = summaries
        .iter()
        .filter(|s| s.classification.is_consolidated)
        .map(|s| s.name.clone())
        .collect();
    if !consolidated.is_empty() {
        return consolidated;
    }

    summaries
        .iter()
        .filter(|s| s.classification.is_financial_statement)
        .take(STATEMENT_FALLBACK_LIMIT)
        .map(|s| s.name.clone())
        .collect()
}

/// Sheet-export selection policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    /// Auto-selected sheets only.
    Auto,
    /// Every sheet in the workbook.
    All,
    /// Auto-selected sheets plus the given zero-based positions. Positions
    /// outside the sheet list are ignored.
    Indices(Vec<usize>),
    /// No export at all, including the auto-selected sheets.
    Skip,
}

/// Resolves a selection policy against the candidate set.
///
/// Pure over its inputs: no prompting, no I/O. Duplicate picks collapse and
/// the result preserves first-pick order.
pub fn resolve_selection(summaries: &[SheetSummary], selection: &SheetSelection) -> Vec<String> {
    match selection {
        SheetSelection::Skip => Vec::new(),
        SheetSelection::Auto => auto_select(summaries),
        SheetSelection::All => summaries.iter().map(|s| s.name.clone()).collect(),
        SheetSelection::Indices(indices) => {
            let mut selected = auto_select(summaries);
            for &idx in indices {
                if let Some(summary) = summaries.get(idx) {
                    if !selected.contains(&summary.name) {
                        selected.push(summary.name.clone());
                    }
                }
            }
            selected
        }
    }
}

/// Serializes one sheet's grid as CSV bytes.
pub fn sheet_to_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &sheet.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExtractError::AnalysisFailed(format!("CSV buffer error: {}", e)))
}

/// Exports the named sheets as `(sheet_name, csv_bytes)` pairs.
///
/// A sheet that is missing or has nothing readable is logged and skipped;
/// the remaining sheets still export.
pub fn export_sheets(workbook: &Workbook, names: &[String]) -> Vec<(String, Vec<u8>)> {
    let mut exported = Vec::with_capacity(names.len());
    for name in names {
        let Some(sheet) = workbook.sheet(name) else {
            tracing::warn!(sheet = %name, "selected sheet not present in workbook");
            continue;
        };
        if sheet.rows.is_empty() {
            tracing::warn!(sheet = %name, "selected sheet has no readable rows");
            continue;
        }
        match sheet_to_csv(sheet) {
            Ok(bytes) => exported.push((name.clone(), bytes)),
            Err(err) => {
                tracing::warn!(sheet = %name, error = %err, "failed to export sheet");
            }
        }
    }
    exported
}

fn read_part(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    path: &str,
) -> Result<Option<String>> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| ExtractError::AnalysisFailed(format!("{}: {}", path, e)))?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ExtractError::AnalysisFailed(format!("{}: {}", path, e))),
    }
}

/// Turns a relationship target into an archive path. Targets are usually
/// relative to `xl/` but may be archive-absolute.
fn resolve_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn xml_err(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::AnalysisFailed(format!("workbook XML error: {}", e))
}

/// Reads `<sheet name="..." r:id="..."/>` entries from `xl/workbook.xml`,
/// in document order.
fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, Option<String>)>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(value),
                        b"id" => rel_id = Some(value),
                        _ => {}
                    }
                }
                if let Some(name) = name {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

/// Reads `Id -> Target` pairs from `xl/_rels/workbook.xml.rels`.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut relationships = HashMap::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(relationships)
}

/// Reads the shared-string table. Rich-text runs inside one `<si>` collapse
/// into a single string.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(xml_err)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"si" => {
                strings.push(std::mem::take(&mut current));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Converts the letter prefix of a cell reference (`BC23`) to a zero-based
/// column index.
fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: String = cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let mut index: usize = 0;
    for c in letters.chars() {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// Reads one worksheet's `<sheetData>` into a padded string grid.
fn parse_sheet_rows(xml: &str, shared_strings: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut cell_column: usize = 0;
    let mut cell_type = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut in_inline_text = false;

    let place_cell =
        |row: &mut Vec<String>, column: usize, cell_type: &str, raw: String| {
            let resolved = match cell_type {
                "s" => raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| shared_strings.get(idx).cloned())
                    .unwrap_or(raw),
                _ => raw,
            };
            if row.len() <= column {
                row.resize(column + 1, String::new());
            }
            row[column] = resolved;
        };

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                current_row = Vec::new();
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                rows.push(std::mem::take(&mut current_row));
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                cell_column = current_row.len();
                cell_type.clear();
                value.clear();
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    let attr_value = attr.unescape_value().map_err(xml_err)?;
                    match attr.key.local_name().as_ref() {
                        b"r" => {
                            if let Some(idx) = column_index(&attr_value) {
                                cell_column = idx;
                            }
                        }
                        b"t" => cell_type = attr_value.into_owned(),
                        _ => {}
                    }
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"c" => {
                place_cell(&mut current_row, cell_column, &cell_type, std::mem::take(&mut value));
            }
            Event::Start(e) if e.local_name().as_ref() == b"v" => in_value = true,
            Event::End(e) if e.local_name().as_ref() == b"v" => in_value = false,
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_inline_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_inline_text = false,
            Event::Text(t) if in_value || in_inline_text => {
                value.push_str(&t.unescape().map_err(xml_err)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    Ok(rows)
}
