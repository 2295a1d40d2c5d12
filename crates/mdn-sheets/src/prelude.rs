//! Prelude module - common imports for mdn-sheets users
//!
//! ```rust
//! use mdn_sheets::prelude::*;
//! ```

pub use crate::{
    // Document functions
    decode,
    encode,
    validate,

    CellAddress,
    // Cell types
    CellValue,

    CsvReader,
    CsvWriter,

    DecodeOptions,
    EncodeOptions,

    // Error types
    Error,
    FileError,
    FormatError,
    RangeReference,
    Result,

    Sheet,
    ValidationReport,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
};
