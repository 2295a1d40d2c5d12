//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The scalar value stored in a grid cell
//! - [`CellAddress`] - A cell's sheet-local location (e.g., "A1")
//! - [`CellCoordinate`] - A cell's workbook-wide location

mod address;
mod value;

pub(crate) use address::{parse_column_token, parse_row_token};
pub use address::{CellAddress, CellCoordinate};
pub use value::{format_number, CellValue};
