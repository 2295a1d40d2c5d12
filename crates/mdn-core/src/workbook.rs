//! Workbook type - the main document structure

use serde_json::{Map, Value};

use crate::cascade::{AttributeSet, EffectiveState};
use crate::cell::CellCoordinate;
use crate::error::{Error, Result};
use crate::reference::SheetScope;
use crate::sheet::{Sheet, SheetExtent};
use crate::{AttrValue, FORMAT_VERSION, FORMULA_KEY, MAX_SHEET_NAME_LEN};

/// Document-level properties carried by the metadata block
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookProperties {
    /// Original container filename
    pub source: String,
    /// Format version string
    pub version: String,
    /// Creation timestamp; filled in at encode time when absent
    pub created: Option<String>,
    /// Metadata keys with no meaning to the converter, passed through as-is
    pub extra: Map<String, Value>,
    /// The optional context part of the metadata block
    pub context: Map<String, Value>,
}

impl Default for WorkbookProperties {
    fn default() -> Self {
        Self {
            source: "workbook.xlsx".to_string(),
            version: FORMAT_VERSION.to_string(),
            created: None,
            extra: Map::new(),
            context: Map::new(),
        }
    }
}

/// A workbook: an ordered sequence of sheets
///
/// Sheet order is declaration order and participates in
/// [`CellCoordinate`] ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    /// Sheets in declaration order
    sheets: Vec<Sheet>,
    /// Metadata block properties
    properties: WorkbookProperties,
    /// Free-text guidance section
    guidance: Option<String>,
}

impl Workbook {
    /// Create an empty workbook with no sheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get a sheet by index
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a mutable sheet by index
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Get a sheet by name
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    /// Get a mutable sheet by name
    pub fn sheet_by_name_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    /// Get the index of a sheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name() == name)
    }

    /// Iterate over all sheets
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// Sheet names in declaration order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    /// Current extent of every sheet, indexed like the sheets
    pub fn extents(&self) -> Vec<SheetExtent> {
        self.sheets.iter().map(Sheet::extent).collect()
    }

    /// Reference scope over this workbook's sheets with `current` as the
    /// sheet unqualified references bind to
    pub fn scope(&self, current: usize) -> SheetScope<'_> {
        SheetScope::new(self.sheets.iter().map(Sheet::name)).with_current(current)
    }

    /// Add a new empty sheet
    pub fn add_sheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_sheet(Sheet::new(name))
    }

    /// Add an existing sheet to the workbook
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<usize> {
        self.validate_sheet_name(sheet.name())?;
        let index = self.sheets.len();
        self.sheets.push(sheet);
        Ok(index)
    }

    /// Get the document properties
    pub fn properties(&self) -> &WorkbookProperties {
        &self.properties
    }

    /// Get the document properties mutably
    pub fn properties_mut(&mut self) -> &mut WorkbookProperties {
        &mut self.properties
    }

    /// Get the free-text guidance
    pub fn guidance(&self) -> Option<&str> {
        self.guidance.as_deref()
    }

    /// Set the free-text guidance
    pub fn set_guidance<S: Into<String>>(&mut self, guidance: Option<S>) {
        self.guidance = guidance.map(Into::into);
    }

    // === Effective state ===

    /// Per-cell formula assignment, keyed by [`FORMULA_KEY`]
    pub fn formula_state(&self) -> EffectiveState<AttrValue> {
        let mut state = EffectiveState::new();
        for (index, sheet) in self.sheets.iter().enumerate() {
            for (addr, formula) in sheet.formulas() {
                let mut attrs = AttributeSet::new();
                attrs.insert(FORMULA_KEY.to_string(), Value::String(formula.to_string()));
                state.insert(addr.on_sheet(index), attrs);
            }
        }
        state
    }

    /// Per-cell formatting assignment
    pub fn format_state(&self) -> EffectiveState<AttrValue> {
        let mut state = EffectiveState::new();
        for (index, sheet) in self.sheets.iter().enumerate() {
            for (addr, attrs) in sheet.formats() {
                state.insert(addr.on_sheet(index), attrs.clone());
            }
        }
        state
    }

    /// Attach a resolved formula assignment to the sheets.
    ///
    /// Every assigned value must be a string.
    pub fn apply_formula_state(&mut self, state: EffectiveState<AttrValue>) -> Result<()> {
        for (coord, mut attrs) in state {
            let Some(value) = attrs.remove(FORMULA_KEY) else {
                continue;
            };
            let Value::String(formula) = value else {
                return Err(Error::other(format!(
                    "formula for {} is not a string",
                    self.describe(coord)
                )));
            };
            self.sheet_for(coord)?.set_formula_at(coord.address(), formula)?;
        }
        Ok(())
    }

    /// Attach a resolved formatting assignment to the sheets
    pub fn apply_format_state(&mut self, state: EffectiveState<AttrValue>) -> Result<()> {
        for (coord, attrs) in state {
            self.sheet_for(coord)?.set_format_at(coord.address(), attrs)?;
        }
        Ok(())
    }

    /// Render a coordinate as `Sheet!A1`
    pub fn describe(&self, coord: CellCoordinate) -> String {
        match self.sheets.get(coord.sheet) {
            Some(sheet) => format!("{}!{}", sheet.name(), coord.address()),
            None => format!("#{}!{}", coord.sheet, coord.address()),
        }
    }

    fn sheet_for(&mut self, coord: CellCoordinate) -> Result<&mut Sheet> {
        let count = self.sheets.len();
        self.sheets
            .get_mut(coord.sheet)
            .ok_or_else(|| Error::SheetNotFound(format!("index {} of {}", coord.sheet, count)))
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("empty name".into()));
        }

        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']', '\n', '\r'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "invalid character '{}' in '{}'",
                c.escape_default(),
                name
            )));
        }

        if self.sheet_index(name).is_some() {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellAddress;
    use serde_json::json;

    #[test]
    fn test_add_sheets_in_order() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_sheet_with_name("Revenue").unwrap(), 0);
        assert_eq!(wb.add_sheet_with_name("Costs").unwrap(), 1);
        assert_eq!(wb.sheet_names(), vec!["Revenue", "Costs"]);
        assert_eq!(wb.sheet_index("Costs"), Some(1));
    }

    #[test]
    fn test_sheet_name_validation() {
        let mut wb = Workbook::new();
        wb.add_sheet_with_name("Data").unwrap();
        assert_eq!(
            wb.add_sheet_with_name("Data"),
            Err(Error::DuplicateSheetName("Data".into()))
        );
        assert!(wb.add_sheet_with_name("").is_err());
        assert!(wb.add_sheet_with_name("a:b").is_err());
        assert!(wb.add_sheet_with_name(&"x".repeat(32)).is_err());
        assert!(wb.add_sheet_with_name("Q1 Revenue").is_ok());
    }

    #[test]
    fn test_formula_state_roundtrip() {
        let mut wb = Workbook::new();
        wb.add_sheet_with_name("A").unwrap();
        wb.add_sheet_with_name("B").unwrap();
        wb.sheet_mut(1).unwrap().set_formula("C2", "=A2+B2").unwrap();

        let state = wb.formula_state();
        let coord = CellAddress::parse("C2").unwrap().on_sheet(1);
        assert_eq!(state[&coord][FORMULA_KEY], json!("=A2+B2"));

        let mut copy = Workbook::new();
        copy.add_sheet_with_name("A").unwrap();
        copy.add_sheet_with_name("B").unwrap();
        copy.apply_formula_state(state).unwrap();
        assert_eq!(copy.sheet(1).unwrap().formula("C2").unwrap(), Some("=A2+B2"));
    }

    #[test]
    fn test_non_string_formula_rejected() {
        let mut wb = Workbook::new();
        wb.add_sheet_with_name("A").unwrap();
        let mut state = EffectiveState::new();
        let mut attrs = AttributeSet::new();
        attrs.insert(FORMULA_KEY.to_string(), json!(42));
        state.insert(CellCoordinate::new(0, 0, 0), attrs);
        assert!(wb.apply_formula_state(state).is_err());
    }
}
