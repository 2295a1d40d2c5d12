//! # mdn-csv
//!
//! Tabular block codec for MDN documents: a sheet's grid to and from CSV
//! text. The first record of a block is the column headers.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
