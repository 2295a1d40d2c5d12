//! # mdn-format
//!
//! Reading, writing and validating MDN documents.
//!
//! A document is a sequence of delimited sections: a YAML metadata block,
//! one CSV block per sheet, a formulas block, an optional format block and
//! optional authoring guidance, closed by `END DOCUMENT`.
//!
//! ```rust
//! use mdn_format::{decode, encode};
//!
//! let text = "\
//! --- MDN:HEADER YAML
//! source: plan.xlsx
//! version: '1.0'
//! created: '2024-01-15T10:30:00Z'
//! sheets:
//! - Plan
//! ---
//! --- MDN:SHEET CSV name=Plan
//! Item,Cost,Yearly
//! Rent,1200
//! ---
//! --- MDN:FORMULAS JSON
//! {\"Plan!C2\": \"=B2*12\"}
//! ---
//! END DOCUMENT
//! ";
//!
//! let (workbook, report) = decode(text).unwrap();
//! assert!(report.is_valid());
//! assert_eq!(workbook.sheet(0).unwrap().formula("C2").unwrap(), Some("=B2*12"));
//!
//! let again = encode(&workbook).unwrap();
//! assert!(again.ends_with("END DOCUMENT\n"));
//! ```

pub mod attributes;
pub mod declarations;
pub mod metadata;
pub mod section;

mod decode;
mod encode;
mod error;
mod options;
mod report;
mod validator;

pub use decode::{decode, decode_with_options, GUIDANCE_SOFT_LIMIT};
pub use encode::{encode, encode_with_options, timestamp, TIMESTAMP_FORMAT};
pub use error::{FormatError, FormatResult};
pub use options::{DecodeOptions, EncodeOptions};
pub use report::ValidationReport;
pub use section::{Section, SectionKind};
pub use validator::{validate, validate_with_options};
