//! # mdn-core
//!
//! Core data structures and the reference-cascade engine for MDN documents.
//!
//! This crate provides:
//! - [`CellValue`], [`CellAddress`] and [`CellCoordinate`] - Cell values and locations
//! - [`RangeReference`] - Parsed cell and range references with their [`Specificity`]
//! - [`resolve`] - Range declarations to per-cell attribute values
//! - [`coalesce`] - Per-cell attribute values back to range declarations
//! - [`Workbook`], [`Sheet`] - The document model
//!
//! ## Example
//!
//! ```rust
//! use mdn_core::{resolve, Declaration, RangeReference, SheetExtent, SheetScope};
//! use serde_json::json;
//!
//! let scope = SheetScope::new(["Revenue"]);
//! let declarations = vec![
//!     Declaration::single(RangeReference::parse("D:D", &scope).unwrap(), "bold", json!(false)),
//!     Declaration::single(RangeReference::parse("D2", &scope).unwrap(), "bold", json!(true)),
//! ];
//! let state = resolve(&declarations, &[SheetExtent::new(3, 4)]).unwrap();
//! assert_eq!(state.len(), 3);
//! ```

pub mod cascade;
pub mod cell;
pub mod coalesce;
pub mod error;
pub mod reference;
pub mod sheet;
pub mod workbook;

// Re-exports for convenience
pub use cascade::{resolve, AttributeSet, Declaration, EffectiveState, Precedence};
pub use cell::{format_number, CellAddress, CellCoordinate, CellValue};
pub use coalesce::coalesce;
pub use error::{Error, Result};
pub use reference::{
    quote_sheet_name, Area, Band, CanonicalCells, RangeReference, RefPart, ReferenceKind,
    SheetScope, Specificity,
};
pub use sheet::{Sheet, SheetExtent};
pub use workbook::{Workbook, WorkbookProperties};

/// Attribute values carried by formula and format declarations
pub type AttrValue = serde_json::Value;

/// Maximum number of rows in a sheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a sheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Attribute key under which formula text is resolved
pub const FORMULA_KEY: &str = "value";

/// Format version written by default
pub const FORMAT_VERSION: &str = "1.0";
