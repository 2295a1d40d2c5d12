//! # mdn-sheets
//!
//! Spreadsheets as plain-text MDN documents.
//!
//! An MDN document carries a workbook's grids as CSV and its formulas and
//! formatting as range declarations, in a form a language model can read
//! and edit. Range declarations cascade: a single cell beats a block, a
//! block beats a row or column band, and a band beats the whole sheet.
//!
//! ## Features
//!
//! - Decode a document into a workbook with per-cell effective state
//! - Encode a workbook back, coalescing cells into the fewest ranges
//! - Validate a document and report every problem found
//! - Read and write single sheets as CSV
//!
//! ## Example
//!
//! ```rust
//! use mdn_sheets::prelude::*;
//!
//! let mut sheet = Sheet::with_headers("Revenue", ["Month", "Revenue", "Total"]);
//! sheet.push_row(vec![CellValue::text("Jan"), 10000.0.into()]).unwrap();
//! sheet.push_row(vec![CellValue::text("Feb"), 10500.0.into()]).unwrap();
//! sheet.set_formula("C2", "=B2*12").unwrap();
//! sheet.set_formula("C3", "=B3*12").unwrap();
//!
//! let mut workbook = Workbook::new();
//! workbook.add_sheet(sheet).unwrap();
//!
//! let text = encode(&workbook).unwrap();
//! assert!(text.contains("\"Revenue!C2\""));
//! assert!(validate(&text).is_valid());
//!
//! // Save to file
//! // workbook.save("revenue.mdn").unwrap();
//! ```

pub mod prelude;

// Re-export core types
pub use mdn_core::{
    coalesce,
    format_number,
    quote_sheet_name,
    resolve,
    Area,
    AttrValue,
    AttributeSet,
    CellAddress,
    CellCoordinate,
    CellValue,
    Declaration,
    EffectiveState,
    // Error types
    Error,
    Precedence,
    RangeReference,
    RefPart,
    ReferenceKind,
    Result,
    Sheet,
    SheetExtent,
    SheetScope,
    Specificity,
    Workbook,
    WorkbookProperties,
    FORMAT_VERSION,
    FORMULA_KEY,
    MAX_COLS,
    // Constants
    MAX_ROWS,
    MAX_SHEET_NAME_LEN,
};

// Re-export document types
pub use mdn_format::{
    decode, decode_with_options, encode, encode_with_options, validate, validate_with_options,
    DecodeOptions, EncodeOptions, FormatError, FormatResult, Section, SectionKind,
    ValidationReport,
};

// Re-export I/O types
pub use mdn_csv::{
    CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter, LineTerminator,
};

use std::path::Path;

use thiserror::Error;

/// Errors from file-level workbook I/O
#[derive(Debug, Error)]
pub enum FileError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be decoded or encoded
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A CSV file could not be read or written
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// Workbook model error
    #[error(transparent)]
    Core(#[from] Error),

    /// The path's extension names no supported format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for file-level workbook I/O
pub type FileResult<T> = std::result::Result<T, FileError>;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt: Sized {
    /// Open a workbook from a `.mdn` or `.csv` file
    fn open<P: AsRef<Path>>(path: P) -> FileResult<Self>;

    /// Open a workbook and keep the findings made while decoding it.
    ///
    /// CSV files produce an empty report.
    fn open_with_report<P: AsRef<Path>>(
        path: P,
        options: &DecodeOptions,
    ) -> FileResult<(Self, ValidationReport)>;

    /// Save the workbook to a `.mdn` file, or its first sheet to a `.csv` file
    fn save<P: AsRef<Path>>(&self, path: P) -> FileResult<()>;
}

/// The lowercased extension of `path`
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn unsupported(path: &Path) -> FileError {
    FileError::UnsupportedFormat(path.display().to_string())
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> FileResult<Workbook> {
        let (workbook, report) = Self::open_with_report(path, &DecodeOptions::default())?;
        for warning in &report.warnings {
            tracing::warn!(%warning, "document warning");
        }
        for error in &report.errors {
            tracing::warn!(%error, "document error");
        }
        Ok(workbook)
    }

    fn open_with_report<P: AsRef<Path>>(
        path: P,
        options: &DecodeOptions,
    ) -> FileResult<(Workbook, ValidationReport)> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("mdn") | Some("md") => {
                let text = std::fs::read_to_string(path)?;
                Ok(decode_with_options(&text, options)?)
            }
            Some("csv") => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Sheet1");
                let sheet = CsvReader::read_file(name, path, &options.csv)?;

                let mut workbook = Workbook::new();
                workbook.add_sheet(sheet)?;
                if let Some(file_name) = path.file_name().and_then(|s| s.to_str()) {
                    workbook.properties_mut().source = file_name.to_string();
                }
                Ok((workbook, ValidationReport::new()))
            }
            _ => Err(unsupported(path)),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> FileResult<()> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("mdn") | Some("md") => {
                let text = encode(self)?;
                std::fs::write(path, text)?;
                Ok(())
            }
            Some("csv") => {
                if let Some(sheet) = self.sheet(0) {
                    Ok(CsvWriter::write_file(sheet, path, &CsvWriteOptions::default())?)
                } else {
                    Err(FileError::Core(Error::other("No sheets to save")))
                }
            }
            _ => Err(unsupported(path)),
        }
    }
}
