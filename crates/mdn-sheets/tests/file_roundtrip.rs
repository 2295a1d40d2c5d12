//! File round-trip tests for .mdn and .csv paths

use mdn_sheets::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn sample_workbook() -> Workbook {
    let mut sheet = Sheet::with_headers("Revenue", ["Month", "Revenue", "Growth", "Total"]);
    sheet
        .push_row(vec![CellValue::text("Jan"), 10000.0.into(), 0.05.into()])
        .unwrap();
    sheet
        .push_row(vec![CellValue::text("Feb"), 10500.0.into(), 0.05.into()])
        .unwrap();
    sheet.set_formula("D2", "=B2*(1+C2)").unwrap();
    sheet.set_formula("D3", "=B3*(1+C3)").unwrap();
    sheet
        .set_format_attribute(CellAddress::new(1, 3), "bold", json!(true))
        .unwrap();

    let mut costs = Sheet::with_headers("Costs", ["Item", "Amount"]);
    costs
        .push_row(vec![CellValue::text("Rent"), 1200.0.into()])
        .unwrap();

    let mut workbook = Workbook::new();
    workbook.add_sheet(sheet).unwrap();
    workbook.add_sheet(costs).unwrap();
    workbook.set_guidance(Some("Totals compound growth."));
    workbook
}

#[test]
fn test_mdn_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plan.mdn");

    let workbook = sample_workbook();
    workbook.save(&path).unwrap();

    let loaded = Workbook::open(&path).unwrap();
    assert_eq!(loaded.sheet_names(), vec!["Revenue", "Costs"]);
    assert_eq!(loaded.formula_state(), workbook.formula_state());
    assert_eq!(loaded.format_state(), workbook.format_state());
    assert_eq!(loaded.guidance(), Some("Totals compound growth."));

    let revenue = loaded.sheet_by_name("Revenue").unwrap();
    assert_eq!(revenue.value("B3").unwrap(), CellValue::Number(10500.0));
    assert_eq!(revenue.formula("D2").unwrap(), Some("=B2*(1+C2)"));
}

#[test]
fn test_open_with_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plan.mdn");
    sample_workbook().save(&path).unwrap();

    let (_, report) = Workbook::open_with_report(&path, &DecodeOptions::default()).unwrap();
    assert!(report.is_valid(), "{report}");
    assert_eq!(report.sheet_names, vec!["Revenue", "Costs"]);
}

#[test]
fn test_csv_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("revenue.csv");

    sample_workbook().save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "Month,Revenue,Growth,Total\nJan,10000,0.05,\nFeb,10500,0.05,\n"
    );

    let loaded = Workbook::open(&path).unwrap();
    assert_eq!(loaded.sheet_names(), vec!["revenue"]);
    assert_eq!(loaded.properties().source, "revenue.csv");
    let sheet = loaded.sheet(0).unwrap();
    assert_eq!(sheet.row_count(), 2);
    assert_eq!(sheet.value("C2").unwrap(), CellValue::Number(0.05));
    // CSV carries no formulas
    assert_eq!(sheet.formula_count(), 0);
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plan.xlsx");
    assert!(matches!(
        sample_workbook().save(&path),
        Err(FileError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        Workbook::open(&path),
        Err(FileError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.mdn");
    assert!(matches!(Workbook::open(&path), Err(FileError::Io(_))));
}

#[test]
fn test_broken_document_fails_to_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.mdn");
    std::fs::write(&path, "--- MDN:HEADER YAML\nsource: a\n---\n").unwrap();
    assert!(matches!(
        Workbook::open(&path),
        Err(FileError::Format(FormatError::MalformedSection { .. }))
    ));
}
