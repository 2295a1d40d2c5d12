//! Sheet type

use std::collections::BTreeMap;

use crate::cascade::AttributeSet;
use crate::cell::{CellAddress, CellValue};
use crate::error::{Error, Result};
use crate::{AttrValue, MAX_COLS, MAX_ROWS};

/// The addressable size of a sheet's grid.
///
/// `rows` counts the header line, which is addressable row 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SheetExtent {
    pub rows: u32,
    pub cols: u16,
}

impl SheetExtent {
    pub fn new(rows: u32, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// Check whether the extent contains no cells
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Check whether an address lies inside the extent
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row < self.rows && addr.col < self.cols
    }
}

/// A sheet: a named grid of values plus its formula and format assignments
///
/// Row 0 of the grid is the header line; data row `i` of [`Sheet::rows`] is
/// grid row `i + 1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Sheet name
    name: String,
    /// Column headers (grid row 0)
    headers: Vec<String>,
    /// Data rows, each padded to the header length
    rows: Vec<Vec<CellValue>>,
    /// Formula text per cell
    formulas: BTreeMap<CellAddress, String>,
    /// Formatting attributes per cell
    formats: BTreeMap<CellAddress, AttributeSet<AttrValue>>,
}

impl Sheet {
    /// Create a new empty sheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a sheet with column headers
    pub fn with_headers<S, I, H>(name: S, headers: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = H>,
        H: Into<String>,
    {
        Self {
            name: name.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Get the column headers
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get the data rows (excluding the header line)
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The addressable extent of the grid
    pub fn extent(&self) -> SheetExtent {
        if self.headers.is_empty() {
            return SheetExtent::default();
        }
        SheetExtent::new(self.rows.len() as u32 + 1, self.headers.len() as u16)
    }

    /// Append a data row, right-padding it with blanks to the header length
    pub fn push_row<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut row: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        if row.len() > self.headers.len() {
            return Err(Error::other(format!(
                "row {} of sheet '{}' has {} values but only {} columns",
                self.rows.len() + 2,
                self.name,
                row.len(),
                self.headers.len()
            )));
        }
        if self.rows.len() as u32 + 1 >= MAX_ROWS {
            return Err(Error::other(format!(
                "sheet '{}' exceeds {} rows",
                self.name, MAX_ROWS
            )));
        }
        row.resize(self.headers.len(), CellValue::Blank);
        self.rows.push(row);
        Ok(())
    }

    // === Cell Access ===

    /// Get a grid value by indices; the header line reads as text
    pub fn value_at(&self, row: u32, col: u16) -> CellValue {
        if row == 0 {
            return match self.headers.get(col as usize) {
                Some(h) if !h.is_empty() => CellValue::text(h.clone()),
                _ => CellValue::Blank,
            };
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// Get a grid value by address string (e.g., "B3")
    pub fn value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.value_at(addr.row, addr.col))
    }

    /// Set a grid value, growing the grid with blanks when needed
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        self.ensure_contains(CellAddress::new(row, col))?;
        let value = value.into();
        if row == 0 {
            self.headers[col as usize] = value.to_string();
        } else {
            self.rows[row as usize - 1][col as usize] = value;
        }
        Ok(())
    }

    /// Set a grid value by address string
    pub fn set_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value_at(addr.row, addr.col, value)
    }

    // === Formulas ===

    /// Get the formula assigned to a cell
    pub fn formula_at(&self, addr: CellAddress) -> Option<&str> {
        self.formulas.get(&addr).map(String::as_str)
    }

    /// Get the formula assigned to a cell by address string
    pub fn formula(&self, address: &str) -> Result<Option<&str>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.formula_at(addr))
    }

    /// Assign a formula to a cell, growing the grid when needed
    pub fn set_formula_at<S: Into<String>>(&mut self, addr: CellAddress, formula: S) -> Result<()> {
        self.ensure_contains(addr)?;
        self.formulas.insert(addr, formula.into());
        Ok(())
    }

    /// Assign a formula to a cell by address string
    pub fn set_formula<S: Into<String>>(&mut self, address: &str, formula: S) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_formula_at(addr, formula)
    }

    /// Iterate over formula cells in row-major order
    pub fn formulas(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.formulas.iter().map(|(a, f)| (*a, f.as_str()))
    }

    /// Number of cells carrying a formula
    pub fn formula_count(&self) -> usize {
        self.formulas.len()
    }

    // === Formatting ===

    /// Get the formatting attributes of a cell
    pub fn format_at(&self, addr: CellAddress) -> Option<&AttributeSet<AttrValue>> {
        self.formats.get(&addr)
    }

    /// Get the formatting attributes of a cell by address string
    pub fn format(&self, address: &str) -> Result<Option<&AttributeSet<AttrValue>>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.format_at(addr))
    }

    /// Set one formatting attribute on a cell
    pub fn set_format_attribute<K: Into<String>>(
        &mut self,
        addr: CellAddress,
        key: K,
        value: AttrValue,
    ) -> Result<()> {
        self.ensure_contains(addr)?;
        self.formats.entry(addr).or_default().insert(key.into(), value);
        Ok(())
    }

    /// Replace all formatting attributes of a cell; an empty set clears them
    pub fn set_format_at(
        &mut self,
        addr: CellAddress,
        attributes: AttributeSet<AttrValue>,
    ) -> Result<()> {
        if attributes.is_empty() {
            self.formats.remove(&addr);
            return Ok(());
        }
        self.ensure_contains(addr)?;
        self.formats.insert(addr, attributes);
        Ok(())
    }

    /// Iterate over formatted cells in row-major order
    pub fn formats(&self) -> impl Iterator<Item = (CellAddress, &AttributeSet<AttrValue>)> {
        self.formats.iter().map(|(a, f)| (*a, f))
    }

    /// Number of cells carrying formatting
    pub fn format_count(&self) -> usize {
        self.formats.len()
    }

    /// Grow the grid so that it contains `addr`
    fn ensure_contains(&mut self, addr: CellAddress) -> Result<()> {
        if addr.row >= MAX_ROWS || addr.col >= MAX_COLS {
            return Err(Error::InvalidAddress(format!(
                "{} is beyond the sheet limits",
                addr
            )));
        }

        let cols = addr.col as usize + 1;
        if self.headers.len() < cols {
            self.headers.resize(cols, String::new());
            for row in &mut self.rows {
                row.resize(cols, CellValue::Blank);
            }
        }

        let width = self.headers.len();
        while (self.rows.len() as u32) < addr.row {
            self.rows.push(vec![CellValue::Blank; width]);
        }
        Ok(())
    }
}
