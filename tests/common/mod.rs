use std::{
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

#[allow(dead_code)]
pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

#[allow(dead_code)]
pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

#[allow(dead_code)]
pub fn source() -> reportkit::RegulatoryFilingSource {
    reportkit::RegulatoryFilingSource::new("test_agent example@example.com").unwrap()
}

fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// Builds a minimal financial-report workbook in memory: one worksheet part
/// per `(name, rows)` pair, all cells as inline strings.
#[allow(dead_code)]
pub fn workbook_bytes(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    let mut workbook_xml = String::from(
        r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels_xml = String::from(
        r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (position, (name, _)) in sheets.iter().enumerate() {
        let id = position + 1;
        workbook_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name, id, id
        ));
        rels_xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            id, id
        ));
    }
    workbook_xml.push_str("</sheets></workbook>");
    rels_xml.push_str("</Relationships>");

    writer.start_file("xl/workbook.xml", options).unwrap();
    writer.write_all(workbook_xml.as_bytes()).unwrap();
    writer
        .start_file("xl/_rels/workbook.xml.rels", options)
        .unwrap();
    writer.write_all(rels_xml.as_bytes()).unwrap();

    for (position, (_, rows)) in sheets.iter().enumerate() {
        let mut sheet_xml = String::from(r#"<?xml version="1.0"?><worksheet><sheetData>"#);
        for (row_idx, row) in rows.iter().enumerate() {
            sheet_xml.push_str(&format!(r#"<row r="{}">"#, row_idx + 1));
            for (col_idx, cell) in row.iter().enumerate() {
                sheet_xml.push_str(&format!(
                    r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    column_letter(col_idx),
                    row_idx + 1,
                    cell
                ));
            }
            sheet_xml.push_str("</row>");
        }
        sheet_xml.push_str("</sheetData></worksheet>");

        writer
            .start_file(format!("xl/worksheets/sheet{}.xml", position + 1), options)
            .unwrap();
        writer.write_all(sheet_xml.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}
