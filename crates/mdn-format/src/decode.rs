//! Document to workbook

use serde_json::Value;

use crate::declarations;
use crate::error::{FormatError, FormatResult};
use crate::metadata;
use crate::options::DecodeOptions;
use crate::report::ValidationReport;
use crate::section::{self, Section, SectionKind};
use mdn_core::{resolve, Declaration, SheetExtent, Workbook};
use mdn_csv::CsvReader;

/// Longest guidance text that does not draw a warning
pub const GUIDANCE_SOFT_LIMIT: usize = 500;

/// Decode a document with default options
pub fn decode(text: &str) -> FormatResult<(Workbook, ValidationReport)> {
    decode_with_options(text, &DecodeOptions::default())
}

/// Decode a document.
///
/// Structural problems, malformed references and unreadable blocks abort.
/// Everything else is collected in the returned report; the workbook is
/// produced even when the report holds errors.
pub fn decode_with_options(
    text: &str,
    options: &DecodeOptions,
) -> FormatResult<(Workbook, ValidationReport)> {
    let sections = section::scan(text)?;
    if let Some(problem) = section::check_order(&sections).into_iter().next() {
        return Err(problem);
    }

    let mut report = ValidationReport::new();
    let workbook = decode_sections(&sections, options, &mut report)?;
    Ok((workbook, report))
}

/// Build a workbook from already ordered sections, recording findings in
/// `report`. Findings made before a failure stay in the report.
pub(crate) fn decode_sections(
    sections: &[Section],
    options: &DecodeOptions,
    report: &mut ValidationReport,
) -> FormatResult<Workbook> {
    report.sections_found = SectionKind::KNOWN
        .iter()
        .filter(|kind| sections.iter().any(|s| &s.kind == *kind))
        .map(|kind| kind.token().to_string())
        .collect();

    let mut workbook = Workbook::new();
    let mut declared_sheets = None;

    for section in sections {
        match &section.kind {
            SectionKind::Header => {
                let metadata = metadata::read(section, report)?;
                *workbook.properties_mut() = metadata.properties;
                declared_sheets = metadata.sheets;
            }
            SectionKind::Sheet => read_sheet(section, options, &mut workbook, report)?,
            SectionKind::Prompt => {
                let text = section.body_text();
                let length = text.trim().chars().count();
                if length == 0 {
                    report.warning("guidance section is empty");
                } else if length > GUIDANCE_SOFT_LIMIT {
                    report.warning(format!(
                        "guidance is {} characters; more than {} may be too long",
                        length, GUIDANCE_SOFT_LIMIT
                    ));
                }
                workbook.set_guidance(Some(text));
            }
            SectionKind::Unknown(token) => {
                report.warning(format!("unknown section {} ignored", section.describe()));
                tracing::warn!(%token, line = section.line, "unknown section kind");
            }
            SectionKind::Formulas | SectionKind::Format => {}
        }
    }

    if let Some(declared) = declared_sheets {
        let actual = workbook.sheet_names();
        if declared.iter().map(String::as_str).ne(actual.iter().copied()) {
            report.warning(format!(
                "metadata lists sheets [{}] but the document holds [{}]",
                declared.join(", "),
                actual.join(", ")
            ));
        }
    }

    // Extents are fixed before any assignment is attached
    let extents = workbook.extents();
    let owned_names: Vec<String> = workbook.sheets().map(|s| s.name().to_string()).collect();
    let names: Vec<&str> = owned_names.iter().map(String::as_str).collect();

    for section in sections {
        let state = match section.kind {
            SectionKind::Formulas | SectionKind::Format => {
                let declarations = declarations::read(section, &names, report)?;
                check_declarations(section, &declarations, &extents, report)?;
                resolve(&declarations, &extents)?
            }
            _ => continue,
        };
        if section.kind == SectionKind::Formulas {
            workbook.apply_formula_state(state)?;
        } else {
            workbook.apply_format_state(state)?;
        }
    }

    if options.strict {
        report.promote_warnings();
    }

    tracing::debug!(
        sheets = workbook.sheet_count(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "decoded document"
    );
    Ok(workbook)
}

fn read_sheet(
    section: &Section,
    options: &DecodeOptions,
    workbook: &mut Workbook,
    report: &mut ValidationReport,
) -> FormatResult<()> {
    let name = section.name().ok_or_else(|| {
        FormatError::malformed(section.line, "tabular section without a name= attribute")
    })?;
    if !section.format_is("CSV") {
        report.warning(format!(
            "{} has format {}; read as CSV",
            section.describe(),
            section.format.as_deref().unwrap_or("(none)")
        ));
    }

    let sheet = CsvReader::read_str(name, &section.body_text(), &options.csv).map_err(|source| {
        FormatError::Tabular {
            sheet: name.to_string(),
            source,
        }
    })?;
    if sheet.headers().is_empty() {
        report.warning(format!("sheet '{}' is empty", name));
    } else if sheet.row_count() == 0 {
        report.warning(format!("sheet '{}' has no data rows", name));
    }

    workbook.add_sheet(sheet)?;
    report.sheet_names.push(name.to_string());
    Ok(())
}

/// Bounds, extent and inertness checks for one block's declarations
fn check_declarations(
    section: &Section,
    declarations: &[Declaration<Value>],
    extents: &[SheetExtent],
    report: &mut ValidationReport,
) -> FormatResult<()> {
    for declaration in declarations {
        let reference = &declaration.reference;
        let location = format!("{} '{}'", section.describe(), reference.text());

        reference
            .check_bounds()
            .map_err(|source| FormatError::Reference {
                location: location.clone(),
                source,
            })?;

        for part in reference.parts_beyond(extents) {
            let extent = extents.get(part.sheet).copied().unwrap_or_default();
            report.error(format!(
                "{}: {} reaches past the sheet's {}x{} grid",
                location,
                part.to_a1_string(),
                extent.rows,
                extent.cols
            ));
        }

        if reference.cells(extents)?.next().is_none() {
            report.warning(format!("{}: covers no cells", location));
        }
    }
    Ok(())
}
