//! Cell and range references
//!
//! A reference string such as `Revenue!D:D`, `B2:C4` or `'Q1 Data'!A1,A3`
//! parses into a [`RangeReference`]: the syntactic [`ReferenceKind`] it was
//! written as, plus the parts it is built from. The kind fixes the
//! reference's [`Specificity`]; the parts fix the cells it denotes once
//! resolved against the sheets' current extents.
//!
//! Column and row references are unbounded until resolution, which
//! intersects them with the target sheet's extent.

use std::collections::BTreeSet;
use std::fmt;

use crate::cell::{parse_column_token, parse_row_token, CellAddress, CellCoordinate};
use crate::error::{Error, Result};
use crate::sheet::SheetExtent;
use crate::{MAX_COLS, MAX_ROWS};

/// The syntactic shape a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// `A1`
    SingleCell,
    /// `A1:C3`, including degenerate blocks such as `A1:A1`
    RectBlock,
    /// `C` or `A:C`
    FullColumn,
    /// `3` or `2:5`
    FullRow,
    /// `*`
    SheetWide,
    /// Comma list of single cells: `A1,A3,B7`
    ExplicitList,
    /// Comma list with at least one non-cell part: `A1,C:C`
    Union,
}

/// Precedence rank of a reference kind, least specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Specificity {
    SheetWide,
    /// Full rows and full columns rank equally
    Line,
    RectBlock,
    ListElement,
    SingleCell,
}

impl ReferenceKind {
    /// Specificity of a single-part kind; lists are ranked by [`RangeReference::specificity`]
    fn base_specificity(self) -> Specificity {
        match self {
            ReferenceKind::SingleCell => Specificity::SingleCell,
            ReferenceKind::ExplicitList => Specificity::ListElement,
            ReferenceKind::RectBlock => Specificity::RectBlock,
            ReferenceKind::FullColumn | ReferenceKind::FullRow => Specificity::Line,
            ReferenceKind::SheetWide | ReferenceKind::Union => Specificity::SheetWide,
        }
    }
}

/// A normalized rectangle of cells, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Area {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl Area {
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    /// A 1x1 area
    pub fn cell(addr: CellAddress) -> Self {
        Self::new(addr.row, addr.col, addr.row, addr.col)
    }

    pub fn start(&self) -> CellAddress {
        CellAddress::new(self.first_row, self.first_col)
    }

    pub fn end(&self) -> CellAddress {
        CellAddress::new(self.last_row, self.last_col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }

    pub fn cell_count(&self) -> u64 {
        (self.last_row - self.first_row + 1) as u64 * (self.last_col - self.first_col + 1) as u64
    }

    /// Intersect with a sheet extent
    pub fn clip(&self, extent: SheetExtent) -> Option<Area> {
        if extent.is_empty() || self.first_row >= extent.rows || self.first_col >= extent.cols {
            return None;
        }
        Some(Area {
            first_row: self.first_row,
            last_row: self.last_row.min(extent.rows - 1),
            first_col: self.first_col,
            last_col: self.last_col.min(extent.cols - 1),
        })
    }

    /// Coordinates of every cell, row by row
    pub fn coordinates(self, sheet: usize) -> impl Iterator<Item = CellCoordinate> {
        (self.first_row..=self.last_row).flat_map(move |row| {
            (self.first_col..=self.last_col).map(move |col| CellCoordinate::new(sheet, row, col))
        })
    }
}

/// One comma-separated part of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefPart {
    /// Index of the sheet the part addresses
    pub sheet: usize,
    /// One of the single-part kinds
    pub kind: ReferenceKind,
    /// Bounds exactly as written; may be inverted
    pub start: CellAddress,
    pub end: CellAddress,
}

impl RefPart {
    fn new(sheet: usize, kind: ReferenceKind, start: CellAddress, end: CellAddress) -> Self {
        Self {
            sheet,
            kind,
            start,
            end,
        }
    }

    /// The normalized area, or `None` when the bounds are inverted
    pub fn area(&self) -> Option<Area> {
        if self.start.row > self.end.row || self.start.col > self.end.col {
            return None;
        }
        Some(Area::new(
            self.start.row,
            self.start.col,
            self.end.row,
            self.end.col,
        ))
    }

    /// Whether the part names cells explicitly (as opposed to whole lines)
    pub fn is_explicit(&self) -> bool {
        matches!(self.kind, ReferenceKind::SingleCell | ReferenceKind::RectBlock)
    }

    /// The part without its sheet prefix, e.g. `B2:C4` or `D:D`
    pub fn to_a1_string(&self) -> String {
        let col = CellAddress::column_to_letters;
        match self.kind {
            ReferenceKind::SingleCell => self.start.to_a1_string(),
            ReferenceKind::FullColumn => format!("{}:{}", col(self.start.col), col(self.end.col)),
            ReferenceKind::FullRow => format!("{}:{}", self.start.row + 1, self.end.row + 1),
            ReferenceKind::SheetWide => "*".to_string(),
            _ => format!("{}:{}", self.start, self.end),
        }
    }
}

/// Sheet names visible to reference parsing, and the sheet that
/// unqualified references bind to
#[derive(Debug, Clone)]
pub struct SheetScope<'a> {
    names: Vec<&'a str>,
    current: usize,
}

impl<'a> SheetScope<'a> {
    pub fn new<I: IntoIterator<Item = &'a str>>(names: I) -> Self {
        Self {
            names: names.into_iter().collect(),
            current: 0,
        }
    }

    pub fn with_current(mut self, current: usize) -> Self {
        self.current = current;
        self
    }

    /// The sheet unqualified references bind to, if it exists
    pub fn current(&self) -> Option<usize> {
        (self.current < self.names.len()).then_some(self.current)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| *n == name)
    }

    pub fn names(&self) -> &[&'a str] {
        &self.names
    }
}

/// A parsed cell or range reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeReference {
    text: String,
    kind: ReferenceKind,
    parts: Vec<RefPart>,
}

impl RangeReference {
    /// Parse a reference string in the context of a sheet scope
    ///
    /// # Examples
    /// ```
    /// use mdn_core::{RangeReference, ReferenceKind, SheetScope};
    ///
    /// let scope = SheetScope::new(["Revenue", "Costs"]);
    /// let r = RangeReference::parse("Costs!B2:C4", &scope).unwrap();
    /// assert_eq!(r.kind(), ReferenceKind::RectBlock);
    /// assert_eq!(r.parts()[0].sheet, 1);
    /// ```
    pub fn parse(text: &str, scope: &SheetScope<'_>) -> Result<Self> {
        let pieces = split_parts(text)?;
        let mut parts = Vec::with_capacity(pieces.len());
        for piece in pieces {
            parts.push(parse_part(text, piece, scope)?);
        }

        let kind = if parts.len() == 1 {
            parts[0].kind
        } else if parts.iter().all(|p| p.kind == ReferenceKind::SingleCell) {
            ReferenceKind::ExplicitList
        } else {
            ReferenceKind::Union
        };

        Ok(Self {
            text: text.trim().to_string(),
            kind,
            parts,
        })
    }

    /// A single-cell reference
    pub fn cell(sheet: usize, addr: CellAddress) -> Self {
        Self::from_part(RefPart::new(sheet, ReferenceKind::SingleCell, addr, addr))
    }

    /// A rectangular block reference
    pub fn block(sheet: usize, start: CellAddress, end: CellAddress) -> Self {
        Self::from_part(RefPart::new(sheet, ReferenceKind::RectBlock, start, end))
    }

    /// A full-column reference spanning `first..=last`
    pub fn columns(sheet: usize, first: u16, last: u16) -> Self {
        Self::from_part(RefPart::new(
            sheet,
            ReferenceKind::FullColumn,
            CellAddress::new(0, first),
            CellAddress::new(MAX_ROWS - 1, last),
        ))
    }

    /// A full-row reference spanning `first..=last`
    pub fn rows(sheet: usize, first: u32, last: u32) -> Self {
        Self::from_part(RefPart::new(
            sheet,
            ReferenceKind::FullRow,
            CellAddress::new(first, 0),
            CellAddress::new(last, MAX_COLS - 1),
        ))
    }

    fn from_part(part: RefPart) -> Self {
        Self {
            text: part.to_a1_string(),
            kind: part.kind,
            parts: vec![part],
        }
    }

    /// The reference text as written
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn parts(&self) -> &[RefPart] {
        &self.parts
    }

    /// Precedence rank derived from the syntactic kind.
    ///
    /// A union ranks as its least specific part.
    pub fn specificity(&self) -> Specificity {
        match self.kind {
            ReferenceKind::Union => self
                .parts
                .iter()
                .map(|p| p.kind.base_specificity())
                .min()
                .unwrap_or(Specificity::SheetWide),
            kind => kind.base_specificity(),
        }
    }

    /// Fail with `OutOfRange` if any part has inverted bounds
    pub fn check_bounds(&self) -> Result<()> {
        match self.parts.iter().find(|p| p.area().is_none()) {
            Some(part) => Err(Error::out_of_range(
                &self.text,
                format!("'{}' starts after it ends", part.to_a1_string()),
            )),
            None => Ok(()),
        }
    }

    /// Lazily enumerate the cells the reference denotes, clipped to `extents`
    /// (indexed by sheet). Cells covered by several parts appear once per part.
    pub fn cells<'a>(
        &'a self,
        extents: &'a [SheetExtent],
    ) -> Result<impl Iterator<Item = CellCoordinate> + 'a> {
        self.check_bounds()?;
        Ok(self.parts.iter().flat_map(move |part| {
            let extent = extents.get(part.sheet).copied().unwrap_or_default();
            part.area()
                .and_then(|area| area.clip(extent))
                .into_iter()
                .flat_map(move |area| area.coordinates(part.sheet))
        }))
    }

    /// Resolve to the sorted, de-duplicated set of cells within `extents`
    pub fn resolve(&self, extents: &[SheetExtent]) -> Result<Vec<CellCoordinate>> {
        let cells: BTreeSet<CellCoordinate> = self.cells(extents)?.collect();
        Ok(cells.into_iter().collect())
    }

    /// Parts naming explicit cells that reach past their sheet's extent
    pub fn parts_beyond<'a>(
        &'a self,
        extents: &'a [SheetExtent],
    ) -> impl Iterator<Item = &'a RefPart> + 'a {
        self.parts.iter().filter(move |part| {
            let extent = extents.get(part.sheet).copied().unwrap_or_default();
            part.is_explicit()
                && part
                    .area()
                    .map_or(false, |area| !extent.contains(&area.end()))
        })
    }

    /// Canonical cell-set form, independent of how the reference was written.
    ///
    /// `A1:A1` and `A1`, or `A:A,B:B` and `A:B`, have equal canonical forms.
    /// Parts with inverted bounds denote no cells.
    pub fn canonical(&self) -> CanonicalCells {
        let mut sheets: Vec<usize> = self.parts.iter().map(|p| p.sheet).collect();
        sheets.sort_unstable();
        sheets.dedup();

        let mut bands = Vec::new();
        for sheet in sheets {
            let areas: Vec<Area> = self
                .parts
                .iter()
                .filter(|p| p.sheet == sheet)
                .filter_map(RefPart::area)
                .collect();
            canonical_bands(sheet, &areas, &mut bands);
        }
        CanonicalCells { bands }
    }

    /// Render with every part qualified by its sheet name
    pub fn display<S: AsRef<str>>(&self, sheet_names: &[S]) -> String {
        self.parts
            .iter()
            .map(|part| match sheet_names.get(part.sheet) {
                Some(name) => format!("{}!{}", quote_sheet_name(name.as_ref()), part.to_a1_string()),
                None => part.to_a1_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Row band of a canonical cell set: rows `first_row..=last_row` covering
/// the listed disjoint, non-adjacent column intervals
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Band {
    pub sheet: usize,
    pub first_row: u32,
    pub last_row: u32,
    pub cols: Vec<(u16, u16)>,
}

/// Canonical representation of a reference's (unbounded) cell set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalCells {
    bands: Vec<Band>,
}

impl CanonicalCells {
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

fn canonical_bands(sheet: usize, areas: &[Area], out: &mut Vec<Band>) {
    let mut bounds: Vec<u32> = areas
        .iter()
        .flat_map(|a| [a.first_row, a.last_row + 1])
        .collect();
    bounds.sort_unstable();
    bounds.dedup();

    let start = out.len();
    for window in bounds.windows(2) {
        let (top, next) = (window[0], window[1]);

        let mut spans: Vec<(u16, u16)> = areas
            .iter()
            .filter(|a| a.first_row <= top && a.last_row >= top)
            .map(|a| (a.first_col, a.last_col))
            .collect();
        spans.sort_unstable();

        let mut cols: Vec<(u16, u16)> = Vec::new();
        for (first, last) in spans {
            match cols.last_mut() {
                Some(prev) if first as u32 <= prev.1 as u32 + 1 => prev.1 = prev.1.max(last),
                _ => cols.push((first, last)),
            }
        }
        if cols.is_empty() {
            continue;
        }

        match out[start..].last_mut() {
            Some(prev) if prev.last_row + 1 == top && prev.cols == cols => prev.last_row = next - 1,
            _ => out.push(Band {
                sheet,
                first_row: top,
                last_row: next - 1,
                cols,
            }),
        }
    }
}

/// Split on commas outside quoted sheet names
fn split_parts(text: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut begin = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&text[begin..i]);
                begin = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(Error::invalid_reference(text, "unterminated quoted sheet name"));
    }
    parts.push(&text[begin..]);

    if let Some(empty) = parts.iter().position(|p| p.trim().is_empty()) {
        return Err(Error::invalid_reference(
            text,
            format!("empty part at position {}", empty + 1),
        ));
    }
    Ok(parts)
}

/// Split `Sheet!body` into an optional sheet name and the body
fn split_sheet<'t>(full: &str, piece: &'t str) -> Result<(Option<String>, &'t str)> {
    if let Some(rest) = piece.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            let body = rest[i + 1..]
                .strip_prefix('!')
                .ok_or_else(|| Error::invalid_reference(full, "expected '!' after quoted sheet name"))?;
            return Ok((Some(name), body));
        }
        return Err(Error::invalid_reference(full, "unterminated quoted sheet name"));
    }

    match piece.split_once('!') {
        Some((name, body)) => Ok((Some(name.to_string()), body)),
        None => Ok((None, piece)),
    }
}

enum Token {
    Cell(CellAddress),
    Column(u16),
    Row(u32),
}

fn classify_token(full: &str, token: &str) -> Result<Token> {
    let bare = token.strip_prefix('$').unwrap_or(token);
    let invalid = |e: Error| match e {
        Error::InvalidAddress(reason) => Error::invalid_reference(full, reason),
        other => other,
    };

    if bare.is_empty() {
        return Err(Error::invalid_reference(full, "empty token"));
    }
    if bare.bytes().all(|b| b.is_ascii_alphabetic()) {
        return parse_column_token(token).map(Token::Column).map_err(invalid);
    }
    if bare.bytes().all(|b| b.is_ascii_digit()) {
        return parse_row_token(token).map(Token::Row).map_err(invalid);
    }
    CellAddress::parse(token).map(Token::Cell).map_err(invalid)
}

fn parse_part(full: &str, piece: &str, scope: &SheetScope<'_>) -> Result<RefPart> {
    let (sheet_name, body) = split_sheet(full, piece.trim())?;

    let sheet = match sheet_name {
        Some(name) if name.is_empty() => {
            return Err(Error::invalid_reference(full, "empty sheet name"));
        }
        Some(name) => scope
            .index_of(&name)
            .ok_or_else(|| Error::invalid_reference(full, format!("unknown sheet '{}'", name)))?,
        None => scope
            .current()
            .ok_or_else(|| Error::invalid_reference(full, "no sheet to bind to"))?,
    };

    let body = body.trim();
    if body == "*" {
        return Ok(RefPart::new(
            sheet,
            ReferenceKind::SheetWide,
            CellAddress::new(0, 0),
            CellAddress::new(MAX_ROWS - 1, MAX_COLS - 1),
        ));
    }

    let (first, second) = match body.split_once(':') {
        Some((a, b)) => {
            if b.contains(':') {
                return Err(Error::invalid_reference(full, "too many ':' separators"));
            }
            (classify_token(full, a.trim())?, Some(classify_token(full, b.trim())?))
        }
        None => (classify_token(full, body)?, None),
    };

    let part = match (first, second) {
        (Token::Cell(addr), None) => RefPart::new(sheet, ReferenceKind::SingleCell, addr, addr),
        (Token::Cell(start), Some(Token::Cell(end))) => {
            RefPart::new(sheet, ReferenceKind::RectBlock, start, end)
        }
        (Token::Column(first), second) => {
            let last = match second {
                None => first,
                Some(Token::Column(last)) => last,
                Some(_) => return Err(Error::invalid_reference(full, "column range mixes token types")),
            };
            RefPart::new(
                sheet,
                ReferenceKind::FullColumn,
                CellAddress::new(0, first),
                CellAddress::new(MAX_ROWS - 1, last),
            )
        }
        (Token::Row(first), second) => {
            let last = match second {
                None => first,
                Some(Token::Row(last)) => last,
                Some(_) => return Err(Error::invalid_reference(full, "row range mixes token types")),
            };
            RefPart::new(
                sheet,
                ReferenceKind::FullRow,
                CellAddress::new(first, 0),
                CellAddress::new(last, MAX_COLS - 1),
            )
        }
        (Token::Cell(_), Some(_)) => {
            return Err(Error::invalid_reference(full, "cell range mixes token types"));
        }
    };
    Ok(part)
}

/// Quote a sheet name when it is not a plain identifier
pub fn quote_sheet_name(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope() -> SheetScope<'static> {
        SheetScope::new(["Revenue", "Costs", "Q1 Data"])
    }

    fn parse(text: &str) -> RangeReference {
        RangeReference::parse(text, &scope()).unwrap()
    }

    fn a1(cells: &[CellCoordinate]) -> Vec<String> {
        cells.iter().map(|c| c.address().to_string()).collect()
    }

    #[test]
    fn test_kinds() {
        assert_eq!(parse("A1").kind(), ReferenceKind::SingleCell);
        assert_eq!(parse("A1:B2").kind(), ReferenceKind::RectBlock);
        assert_eq!(parse("A1:A1").kind(), ReferenceKind::RectBlock);
        assert_eq!(parse("D:D").kind(), ReferenceKind::FullColumn);
        assert_eq!(parse("D").kind(), ReferenceKind::FullColumn);
        assert_eq!(parse("2:4").kind(), ReferenceKind::FullRow);
        assert_eq!(parse("*").kind(), ReferenceKind::SheetWide);
        assert_eq!(parse("A1,A3,B7").kind(), ReferenceKind::ExplicitList);
        assert_eq!(parse("A1,C:C").kind(), ReferenceKind::Union);
    }

    #[test]
    fn test_specificity_order() {
        assert!(parse("A1").specificity() > parse("A1,A2").specificity());
        assert!(parse("A1,A2").specificity() > parse("A1:A1").specificity());
        assert!(parse("A1:A1").specificity() > parse("A:A").specificity());
        assert_eq!(parse("A:A").specificity(), parse("1:1").specificity());
        assert!(parse("1:1").specificity() > parse("*").specificity());
        assert_eq!(parse("A1,B:B").specificity(), Specificity::Line);
    }

    #[test]
    fn test_sheet_binding() {
        let r = RangeReference::parse("B2", &scope().with_current(1)).unwrap();
        assert_eq!(r.parts()[0].sheet, 1);
        assert_eq!(parse("Costs!B2").parts()[0].sheet, 1);
        assert_eq!(parse("'Q1 Data'!B2").parts()[0].sheet, 2);
        assert_eq!(parse("A1,Costs!B2").parts()[1].sheet, 1);
    }

    #[test]
    fn test_quoted_sheet_names() {
        let s = SheetScope::new(["Bob's, Data"]);
        let r = RangeReference::parse("'Bob''s, Data'!A1,'Bob''s, Data'!C3", &s).unwrap();
        assert_eq!(r.kind(), ReferenceKind::ExplicitList);
        assert_eq!(r.display(&["Bob's, Data"]), "'Bob''s, Data'!A1,'Bob''s, Data'!C3");
    }

    #[test]
    fn test_invalid_references() {
        let cases = [
            "", "A1,", "Nope!A1", "!A1", "A1:B", "A:1", "1:B2", "A1:B2:C3", "A0", "Revenue!",
            "'Q1 Data!A1", "'Q1 Data'A1", "XFE1",
        ];
        for case in cases {
            let err = RangeReference::parse(case, &scope()).unwrap_err();
            assert!(
                matches!(err, Error::InvalidReference { .. }),
                "{case:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_unqualified_without_sheets() {
        let empty = SheetScope::new(Vec::<&str>::new());
        assert!(RangeReference::parse("A1", &empty).is_err());
    }

    #[test]
    fn test_full_column_is_bounded_by_extent() {
        let extents = [SheetExtent::new(3, 4)];
        let cells = parse("A:A").resolve(&extents).unwrap();
        assert_eq!(a1(&cells), vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn test_full_row_and_sheet_wide() {
        let extents = [SheetExtent::new(2, 2)];
        assert_eq!(a1(&parse("2:2").resolve(&extents).unwrap()), vec!["A2", "B2"]);
        assert_eq!(parse("*").resolve(&extents).unwrap().len(), 4);
    }

    #[test]
    fn test_block_clipped_to_extent() {
        let extents = [SheetExtent::new(2, 2)];
        let r = parse("B2:D9");
        assert_eq!(a1(&r.resolve(&extents).unwrap()), vec!["B2"]);
        assert_eq!(r.parts_beyond(&extents).count(), 1);
        assert_eq!(parse("A:Z").parts_beyond(&extents).count(), 0);
    }

    #[test]
    fn test_empty_sheet_resolves_to_nothing() {
        let extents = [SheetExtent::default()];
        assert!(parse("A:A").resolve(&extents).unwrap().is_empty());
        assert!(parse("A1").resolve(&extents).unwrap().is_empty());
    }

    #[test]
    fn test_inverted_bounds_fail_at_resolution() {
        let r = parse("C3:A1");
        let err = r.resolve(&[SheetExtent::new(5, 5)]).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
        assert!(matches!(parse("C:A").check_bounds(), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_union_resolves_deduplicated() {
        let extents = [SheetExtent::new(3, 3)];
        let cells = parse("A1:B2,B2,B:B").resolve(&extents).unwrap();
        assert_eq!(a1(&cells), vec!["A1", "B1", "A2", "B2", "B3"]);
    }

    #[test]
    fn test_canonical_equivalence() {
        assert_eq!(parse("A1:A1").canonical(), parse("A1").canonical());
        assert_eq!(parse("A:A,B:B").canonical(), parse("A:B").canonical());
        assert_eq!(parse("A1:B1,A2:B2").canonical(), parse("A1:B2").canonical());
        assert_eq!(parse("$A$1:B2").canonical(), parse("A1:B2").canonical());
        assert_ne!(parse("A1:B2").canonical(), parse("A1:B3").canonical());
        assert_ne!(parse("A1").canonical(), parse("Costs!A1").canonical());
        // Equivalent sets keep their own specificity
        assert_ne!(parse("A1:A1").specificity(), parse("A1").specificity());
    }

    #[test]
    fn test_display() {
        let names = ["Revenue", "Costs", "Q1 Data"];
        assert_eq!(parse("d2").display(&names), "Revenue!D2");
        assert_eq!(parse("Costs!$B$2:C4").display(&names), "Costs!B2:C4");
        assert_eq!(parse("'Q1 Data'!D").display(&names), "'Q1 Data'!D:D");
        assert_eq!(parse("3").display(&names), "Revenue!3:3");
        assert_eq!(RangeReference::columns(1, 0, 2).display(&names), "Costs!A:C");
        assert_eq!(RangeReference::rows(0, 1, 1).display(&names), "Revenue!2:2");
    }

    #[test]
    fn test_display_reparses_to_same_reference_shape() {
        let names = ["Revenue", "Costs", "Q1 Data"];
        for text in ["A1", "B2:C4", "D:F", "2:3", "*", "A1,A3", "'Q1 Data'!A1,C:C"] {
            let original = parse(text);
            let again = parse(&original.display(&names));
            assert_eq!(again.kind(), original.kind());
            assert_eq!(again.parts(), original.parts());
        }
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Revenue"), "Revenue");
        assert_eq!(quote_sheet_name("Sheet_1.a"), "Sheet_1.a");
        assert_eq!(quote_sheet_name("Q1 Data"), "'Q1 Data'");
        assert_eq!(quote_sheet_name("1st"), "'1st'");
        assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
    }
}
