//! Property tests for encode / decode
//!
//! Cell text is drawn partly from lines that look like section delimiters,
//! so grids and guidance must survive the section grammar unchanged.

use mdn_core::{CellAddress, CellValue, Sheet, Workbook};
use mdn_format::{decode, encode};
use proptest::prelude::*;
use serde_json::json;

const AWKWARD: [&str; 10] = [
    "---",
    "END DOCUMENT",
    "a\n---",
    "x\nEND DOCUMENT",
    "--- MDN:SHEET CSV name=X",
    "\\---",
    "say \"hi\"",
    "a,b",
    "007",
    "\\note",
];

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(AWKWARD.to_vec()).prop_map(str::to_string),
        "[a-z]{1,6}",
    ]
}

fn arb_value() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Blank),
        (-400i32..400).prop_map(|n| CellValue::Number(n as f64 / 4.0)),
        arb_text().prop_map(CellValue::Text),
    ]
}

/// One sheet: headers, rows of the same width, and cell assignments
/// addressed relative to the grid
type SheetParts = (
    Vec<String>,
    Vec<Vec<CellValue>>,
    Vec<(u32, u16, i32)>,
    Vec<(u32, u16, bool)>,
);

fn arb_sheet() -> impl Strategy<Value = SheetParts> {
    (1usize..4, 0usize..4).prop_flat_map(|(width, height)| {
        (
            prop::collection::vec("[a-z]{1,5}", width),
            prop::collection::vec(prop::collection::vec(arb_value(), width), height),
            prop::collection::vec((0..=height as u32, 0..width as u16, 0i32..3), 0..5),
            prop::collection::vec((0..=height as u32, 0..width as u16, any::<bool>()), 0..5),
        )
    })
}

fn arb_guidance() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::collection::vec(arb_text(), 1..4).prop_map(|lines| lines.join("\n")))
}

fn build(sheets: Vec<SheetParts>, guidance: Option<String>) -> Workbook {
    let mut workbook = Workbook::new();
    for (index, (headers, rows, formulas, formats)) in sheets.into_iter().enumerate() {
        let mut sheet = Sheet::with_headers(format!("S{}", index + 1), headers);
        for row in rows {
            sheet.push_row(row).unwrap();
        }
        for (row, col, n) in formulas {
            sheet
                .set_formula_at(CellAddress::new(row, col), format!("=A1+{}", n))
                .unwrap();
        }
        for (row, col, bold) in formats {
            let addr = CellAddress::new(row, col);
            if bold {
                sheet.set_format_attribute(addr, "bold", json!(true)).unwrap();
            } else {
                sheet
                    .set_format_attribute(addr, "numberFormat", json!("0.00"))
                    .unwrap();
            }
        }
        workbook.add_sheet(sheet).unwrap();
    }
    workbook.set_guidance(guidance);
    workbook
}

proptest! {
    #[test]
    fn decode_inverts_encode(
        sheets in prop::collection::vec(arb_sheet(), 1..3),
        guidance in arb_guidance(),
    ) {
        let workbook = build(sheets, guidance);
        let text = encode(&workbook).unwrap();
        let (decoded, report) = decode(&text).unwrap();

        prop_assert!(report.is_valid(), "{}\n{}", report, text);
        prop_assert_eq!(decoded.formula_state(), workbook.formula_state());
        prop_assert_eq!(decoded.format_state(), workbook.format_state());
        prop_assert_eq!(decoded.guidance(), workbook.guidance());
        prop_assert_eq!(decoded.sheet_count(), workbook.sheet_count());
        for (before, after) in workbook.sheets().zip(decoded.sheets()) {
            prop_assert_eq!(before.headers(), after.headers());
            prop_assert_eq!(before.rows(), after.rows());
        }
    }
}
