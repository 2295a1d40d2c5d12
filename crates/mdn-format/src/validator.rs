//! Whole-document validation
//!
//! Runs the same pipeline as decoding but never fails: fatal problems end
//! up in the report next to everything found before them. A document that
//! decodes cleanly is also re-encoded and decoded again, and any drift in
//! the effective state is an error.

use crate::decode::decode_sections;
use crate::encode::encode_with_options;
use crate::options::{DecodeOptions, EncodeOptions};
use crate::report::ValidationReport;
use crate::section;
use mdn_core::Workbook;

/// Validate a document with default options
pub fn validate(text: &str) -> ValidationReport {
    validate_with_options(text, &DecodeOptions::default())
}

/// Validate a document
pub fn validate_with_options(text: &str, options: &DecodeOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    let sections = match section::scan(text) {
        Ok(sections) => sections,
        Err(err) => {
            report.error(err.to_string());
            return report;
        }
    };

    let problems = section::check_order(&sections);
    if !problems.is_empty() {
        for problem in problems {
            report.error(problem.to_string());
        }
        return report;
    }

    let workbook = match decode_sections(&sections, options, &mut report) {
        Ok(workbook) => workbook,
        Err(err) => {
            report.error(err.to_string());
            return report;
        }
    };

    if let Err(message) = check_round_trip(&workbook, options) {
        report.error(message);
    }

    tracing::debug!(
        valid = report.is_valid(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated document"
    );
    report
}

/// Encode then decode `workbook` and compare what comes back
fn check_round_trip(workbook: &Workbook, options: &DecodeOptions) -> Result<(), String> {
    let encode_options = EncodeOptions {
        created: Some(
            workbook
                .properties()
                .created
                .clone()
                .unwrap_or_else(crate::encode::timestamp),
        ),
        ..Default::default()
    };
    let text = encode_with_options(workbook, &encode_options)
        .map_err(|e| format!("re-encoding failed: {}", e))?;

    let sections = section::parse(&text).map_err(|e| format!("re-encoded document: {}", e))?;
    let mut scratch = ValidationReport::new();
    let decoded = decode_sections(&sections, options, &mut scratch)
        .map_err(|e| format!("re-encoded document does not decode: {}", e))?;

    if decoded.formula_state() != workbook.formula_state() {
        return Err("formulas change when the document is re-encoded".to_string());
    }
    if decoded.format_state() != workbook.format_state() {
        return Err("formatting changes when the document is re-encoded".to_string());
    }
    for (before, after) in workbook.sheets().zip(decoded.sheets()) {
        if before.headers() != after.headers() || before.rows() != after.rows() {
            return Err(format!(
                "sheet '{}' changes when the document is re-encoded",
                before.name()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = "\
--- MDN:HEADER YAML
source: revenue.xlsx
version: '1.0'
created: '2024-01-15T10:30:00Z'
sheets:
- Revenue
---
--- MDN:SHEET CSV name=Revenue
Month,Revenue,Growth,Total
Jan,10000,0.05
Feb,10500,0.05
---
--- MDN:FORMULAS JSON
{\"Revenue!D2\": \"=B2*(1+C2)\", \"Revenue!D3\": \"=B3*(1+C3)\"}
---
--- MDN:FORMAT JSON
{\"Revenue!D:D\": {\"numberFormat\": \"$#,##0\"}, \"Revenue!D2\": {\"bold\": true}}
---
--- MDN:AI_PROMPT
Growth is a monthly rate.
---
END DOCUMENT
";

    #[test]
    fn test_valid_document() {
        let report = validate(DOCUMENT);
        assert!(report.is_valid(), "{report}");
        assert!(report.warnings.is_empty(), "{report}");
        assert_eq!(report.sheet_names, vec!["Revenue"]);
        assert_eq!(
            report.sections_found,
            vec![
                "MDN:HEADER",
                "MDN:SHEET",
                "MDN:FORMULAS",
                "MDN:FORMAT",
                "MDN:AI_PROMPT"
            ]
        );
    }

    #[test]
    fn test_quoted_delimiter_cell_survives_round_trip_check() {
        let text = DOCUMENT.replace("Feb,10500,0.05", "\"---\",10500,0.05");
        let report = validate(&text);
        assert!(report.is_valid(), "{report}");
        assert!(report.warnings.is_empty(), "{report}");
    }

    #[test]
    fn test_grammar_error_is_reported() {
        let report = validate(&DOCUMENT.replace("END DOCUMENT\n", ""));
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert!(report.sections_found.is_empty());
    }

    #[test]
    fn test_every_order_problem_is_reported() {
        let text = DOCUMENT
            .replace(
                "--- MDN:FORMULAS JSON\n{\"Revenue!D2\": \"=B2*(1+C2)\", \"Revenue!D3\": \"=B3*(1+C3)\"}\n---\n",
                "",
            )
            .replace(
                "--- MDN:AI_PROMPT\nGrowth is a monthly rate.\n---\n",
                "--- MDN:AI_PROMPT\nGrowth is a monthly rate.\n---\n--- MDN:AI_PROMPT\nagain\n---\n",
            );
        let report = validate(&text);
        assert_eq!(report.errors.len(), 2, "{report}");
    }

    #[test]
    fn test_undeclared_sheet_keeps_earlier_findings() {
        let text = DOCUMENT
            .replace("version: '1.0'", "version: v1")
            .replace("\"Revenue!D3\"", "\"Costs!D3\"");
        let report = validate(&text);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("Costs!D3")), "{report}");
        assert!(report.warnings.iter().any(|w| w.contains("v1")), "{report}");
        assert_eq!(report.sheet_names, vec!["Revenue"]);
    }

    #[test]
    fn test_reference_past_grid() {
        let report = validate(&DOCUMENT.replace("\"Revenue!D2\": {", "\"Revenue!D2:E2\": {"));
        assert_eq!(report.errors.len(), 1, "{report}");
        assert!(report.errors[0].contains("D2:E2"));
    }

    #[test]
    fn test_advisory_findings() {
        let text = DOCUMENT
            .replace("\"=B3*(1+C3)\"", "\"B3*(1+C3)\"")
            .replace("{\"bold\": true}", "{\"bold\": \"yes\", \"border\": \"thin\"}")
            .replace("Growth is a monthly rate.", &"x".repeat(600));
        let report = validate(&text);
        assert!(report.is_valid(), "{report}");
        assert_eq!(report.warnings.len(), 4, "{report}");
    }

    #[test]
    fn test_strict_mode() {
        let text = DOCUMENT.replace("\"=B3*(1+C3)\"", "\"B3*(1+C3)\"");
        let options = DecodeOptions {
            strict: true,
            ..Default::default()
        };
        let report = validate_with_options(&text, &options);
        assert!(!report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_round_trip_of_valid_workbook_holds() {
        let (workbook, _) = crate::decode::decode(DOCUMENT).unwrap();
        assert_eq!(check_round_trip(&workbook, &DecodeOptions::default()), Ok(()));
    }
}
