mod common;

use common::workbook_bytes;
use reportkit::{SheetSelection, Workbook, auto_select, resolve_selection};

#[test]
fn consolidated_sheet_is_the_only_auto_selection() {
    let bytes = workbook_bytes(&[
        ("Cover Page", vec![vec!["Entity", "Apple Inc."]]),
        (
            "Consolidated Balance Sheets",
            vec![
                vec!["Item", "2024", "2023"],
                vec!["Cash", "100", "90"],
            ],
        ),
        ("Notes", vec![vec!["Note 1"]]),
    ]);

    let workbook = Workbook::parse(&bytes).unwrap();
    let selected = auto_select(&workbook.summaries());
    assert_eq!(selected, vec!["Consolidated Balance Sheets"]);
}

#[test]
fn no_candidates_yields_empty_selection() {
    let bytes = workbook_bytes(&[
        ("Cover Page", vec![vec!["Entity"]]),
        ("Notes", vec![vec!["Note 1"]]),
    ]);

    let workbook = Workbook::parse(&bytes).unwrap();
    assert!(auto_select(&workbook.summaries()).is_empty());
}

#[test]
fn statement_fallback_takes_first_three_in_sheet_order() {
    let bytes = workbook_bytes(&[
        ("Cover Page", vec![vec!["Entity"]]),
        ("Income Overview", vec![vec!["Revenue"]]),
        ("Balance Overview", vec![vec!["Assets"]]),
        ("Cash Overview", vec![vec!["Flows"]]),
        ("Statement Extras", vec![vec!["More"]]),
    ]);

    let workbook = Workbook::parse(&bytes).unwrap();
    let selected = auto_select(&workbook.summaries());
    assert_eq!(
        selected,
        vec!["Income Overview", "Balance Overview", "Cash Overview"]
    );
}

#[test]
fn selection_is_idempotent_over_reparse() {
    let bytes = workbook_bytes(&[
        ("Consolidated Statements of Operations", vec![vec!["Revenue", "1"]]),
        ("Consolidated Balance Sheets", vec![vec!["Assets", "2"]]),
        ("Notes", vec![vec!["Note"]]),
    ]);

    let first = auto_select(&Workbook::parse(&bytes).unwrap().summaries());
    let second = auto_select(&Workbook::parse(&bytes).unwrap().summaries());
    assert_eq!(first, second);
}

#[test]
fn summaries_expose_column_preview() {
    let bytes = workbook_bytes(&[(
        "Consolidated Balance Sheets",
        vec![vec!["Item", "2024", "2023"], vec!["Cash", "100", "90"]],
    )]);

    let workbook = Workbook::parse(&bytes).unwrap();
    let summaries = workbook.summaries();
    assert_eq!(summaries[0].columns, vec!["Item", "2024", "2023"]);
    assert!(summaries[0].classification.is_consolidated);
    assert!(summaries[0].classification.is_financial_statement);
}

#[test]
fn export_selected_sheets_as_csv() {
    let bytes = workbook_bytes(&[
        ("Cover Page", vec![vec!["Entity"]]),
        (
            "Consolidated Balance Sheets",
            vec![vec!["Item", "2024"], vec!["Cash", "100"]],
        ),
    ]);

    let workbook = Workbook::parse(&bytes).unwrap();
    let selected = resolve_selection(&workbook.summaries(), &SheetSelection::Auto);
    let exported = reportkit::export_sheets(&workbook, &selected);

    assert_eq!(exported.len(), 1);
    let (name, csv) = &exported[0];
    assert_eq!(name, "Consolidated Balance Sheets");
    assert_eq!(String::from_utf8_lossy(csv), "Item,2024\nCash,100\n");
}

#[test]
fn garbage_bytes_fail_analysis() {
    assert!(Workbook::parse(b"this is not a workbook").is_err());
}
