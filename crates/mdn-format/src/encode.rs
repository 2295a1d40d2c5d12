//! Workbook to document

use chrono::Utc;

use crate::declarations;
use crate::error::{FormatError, FormatResult};
use crate::metadata;
use crate::options::EncodeOptions;
use crate::section::{self, Section, SectionKind};
use mdn_core::{coalesce, Workbook};
use mdn_csv::CsvWriter;

/// Timestamp layout of the `created` field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The current UTC time as written in `created`
pub fn timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Encode a workbook with default options
pub fn encode(workbook: &Workbook) -> FormatResult<String> {
    encode_with_options(workbook, &EncodeOptions::default())
}

/// Encode a workbook.
///
/// Formula and format assignments are coalesced into range declarations
/// qualified with their sheet names. The formulas block is always written;
/// the format and guidance blocks only when there is something to say.
pub fn encode_with_options(workbook: &Workbook, options: &EncodeOptions) -> FormatResult<String> {
    if workbook.is_empty() {
        return Err(FormatError::MissingSection(
            SectionKind::Sheet.token().to_string(),
        ));
    }

    let names = workbook.sheet_names();
    let mut properties = workbook.properties().clone();
    if let Some(version) = &options.version {
        properties.version = version.clone();
    }
    if let Some(source) = &options.source {
        properties.source = source.clone();
    }
    let created = options
        .created
        .clone()
        .or_else(|| properties.created.clone())
        .unwrap_or_else(timestamp);

    let mut sections = Vec::with_capacity(workbook.sheet_count() + 4);
    sections.push(metadata::write(
        &properties,
        &names,
        &created,
        options.emit_context,
    )?);

    for sheet in workbook.sheets() {
        let body = CsvWriter::write_string(sheet, &options.csv).map_err(|source| {
            FormatError::Tabular {
                sheet: sheet.name().to_string(),
                source,
            }
        })?;
        sections.push(
            Section::new(SectionKind::Sheet)
                .with_attribute("name", sheet.name())
                .with_body(&body),
        );
    }

    let formulas = coalesce(&workbook.formula_state())?;
    sections.push(declarations::write(
        SectionKind::Formulas,
        &formulas,
        &names,
    )?);

    let format_state = workbook.format_state();
    let mut format_count = 0;
    if !format_state.is_empty() {
        let formats = coalesce(&format_state)?;
        format_count = formats.len();
        sections.push(declarations::write(SectionKind::Format, &formats, &names)?);
    }

    if let Some(guidance) = workbook.guidance() {
        sections.push(Section::new(SectionKind::Prompt).with_body(guidance));
    }

    tracing::debug!(
        sheets = workbook.sheet_count(),
        formula_declarations = formulas.len(),
        format_declarations = format_count,
        "encoded workbook"
    );
    Ok(section::serialize(&sections))
}
