//! Cell address and coordinate types

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A sheet-local cell address (e.g., "A1", "$B$2")
///
/// `$` markers are accepted on input and dropped: references in an MDN
/// document are never copied or moved, so absolute and relative forms address
/// the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use mdn_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!(addr.row, 0);
    /// assert_eq!(addr.col, 0);
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert_eq!(addr.col, 1);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let split = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '$' || c.is_ascii_digit())
            .map(|(i, _)| i)
            .ok_or_else(|| Error::InvalidAddress(format!("no row number in '{}'", s)))?;

        let col = parse_column_token(&s[..split])?;
        let row = parse_row_token(&s[split..])?;

        Ok(Self { row, col })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1; // 1-based for calculation

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > MAX_COLS as u32 {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' beyond {}",
                    letters,
                    Self::column_to_letters(MAX_COLS - 1)
                )));
            }
        }

        Ok((col - 1) as u16)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }

    /// Attach this address to a sheet
    pub fn on_sheet(&self, sheet: usize) -> CellCoordinate {
        CellCoordinate::new(sheet, self.row, self.col)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse a bare column token such as `C` or `$AB` into a 0-based index
pub(crate) fn parse_column_token(token: &str) -> Result<u16> {
    let letters = token.strip_prefix('$').unwrap_or(token);
    CellAddress::letters_to_column(letters)
}

/// Parse a bare row token such as `7` or `$12` into a 0-based index
pub(crate) fn parse_row_token(token: &str) -> Result<u32> {
    let digits = token.strip_prefix('$').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAddress(format!(
            "invalid row number '{}'",
            token
        )));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("invalid row number '{}'", token)))?;

    // Rows are 1-based in A1 notation
    if row == 0 {
        return Err(Error::InvalidAddress(format!(
            "row number must be >= 1 in '{}'",
            token
        )));
    }
    if row > MAX_ROWS {
        return Err(Error::InvalidAddress(format!(
            "row {} beyond {}",
            row, MAX_ROWS
        )));
    }

    Ok(row - 1)
}

/// A cell's position in a workbook.
///
/// Ordered by sheet declaration order, then row, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoordinate {
    /// Index of the owning sheet in workbook declaration order
    pub sheet: usize,
    pub row: u32,
    pub col: u16,
}

impl CellCoordinate {
    pub fn new(sheet: usize, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }

    /// The sheet-local part of this coordinate
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }
}
