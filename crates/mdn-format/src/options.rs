//! Decode and encode options

use mdn_csv::{CsvReadOptions, CsvWriteOptions};

/// Options for decoding a document
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// How tabular blocks are read
    pub csv: CsvReadOptions,
    /// Treat every warning as an error
    pub strict: bool,
}

/// Options for encoding a workbook
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Format version to write instead of the workbook's own
    pub version: Option<String>,
    /// Source filename to write instead of the workbook's own
    pub source: Option<String>,
    /// Fixed `created` timestamp; otherwise the workbook's, else now
    pub created: Option<String>,
    /// How tabular blocks are written
    pub csv: CsvWriteOptions,
    /// Write the context part of the metadata block when there is one
    pub emit_context: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: None,
            source: None,
            created: None,
            csv: CsvWriteOptions::default(),
            emit_context: true,
        }
    }
}
