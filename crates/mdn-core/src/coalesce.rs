//! Range coalescing: per-cell attribute values back to range declarations
//!
//! The inverse of [`cascade::resolve`](crate::cascade::resolve). Cells are
//! grouped by sheet and attribute key; within a group a streaming scan merges
//! runs of equal values into rectangles, extending a rectangle from the row
//! above only when the column span matches exactly. This is not a minimum
//! rectangle cover, but it is linear and deterministic.
//!
//! Rectangles of one key never overlap, so the output reproduces its input
//! regardless of precedence. It is still ordered broadest first so that any
//! overlap would resolve in favor of the smaller rectangle.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::cascade::{resolve, AttributeSet, Declaration, EffectiveState};
use crate::cell::CellAddress;
use crate::error::{Error, Result};
use crate::reference::{Area, RangeReference};
use crate::sheet::SheetExtent;

/// Compress a per-cell assignment into range declarations.
///
/// The result is verified by resolving it again; a mismatch is reported as
/// [`Error::CoalesceInvariantViolation`].
pub fn coalesce<V: Clone + PartialEq>(state: &EffectiveState<V>) -> Result<Vec<Declaration<V>>> {
    let mut groups: BTreeMap<(usize, &str), BTreeMap<CellAddress, &V>> = BTreeMap::new();
    for (coord, attributes) in state {
        for (key, value) in attributes {
            groups
                .entry((coord.sheet, key.as_str()))
                .or_default()
                .insert(coord.address(), value);
        }
    }

    // Identical rectangles across keys share one declaration
    let mut merged: BTreeMap<(usize, Area), AttributeSet<V>> = BTreeMap::new();
    for ((sheet, key), cells) in &groups {
        for (area, value) in rectangles(cells) {
            merged
                .entry((*sheet, area))
                .or_default()
                .insert(key.to_string(), value.clone());
        }
    }

    let mut entries: Vec<_> = merged.into_iter().collect();
    entries.sort_by_key(|((sheet, area), _)| {
        (
            *sheet,
            Reverse(area.cell_count()),
            area.first_row,
            area.first_col,
            area.last_row,
            area.last_col,
        )
    });

    let declarations: Vec<Declaration<V>> = entries
        .into_iter()
        .map(|((sheet, area), attributes)| {
            let reference = if area.is_single_cell() {
                RangeReference::cell(sheet, area.start())
            } else {
                RangeReference::block(sheet, area.start(), area.end())
            };
            Declaration::new(reference, attributes)
        })
        .collect();

    verify(state, &declarations)?;

    tracing::debug!(
        cells = state.len(),
        declarations = declarations.len(),
        "coalesced attribute grid"
    );
    Ok(declarations)
}

/// Streaming rectangular partition of one (sheet, key) group
fn rectangles<'v, V: PartialEq>(cells: &BTreeMap<CellAddress, &'v V>) -> Vec<(Area, &'v V)> {
    let mut done = Vec::new();
    // Rectangles ending on the previous row, keyed by column span
    let mut open: AHashMap<(u16, u16), (Area, &'v V)> = AHashMap::new();

    let mut iter = cells.iter().peekable();
    while let Some((first, _)) = iter.peek() {
        let row = first.row;

        let mut runs: Vec<(u16, u16, &'v V)> = Vec::new();
        while let Some((addr, value)) = iter.next_if(|(addr, _)| addr.row == row) {
            match runs.last_mut() {
                Some(run) if run.1 + 1 == addr.col && *run.2 == **value => run.1 = addr.col,
                _ => runs.push((addr.col, addr.col, *value)),
            }
        }

        let mut next_open = AHashMap::with_capacity(runs.len());
        for (first_col, last_col, value) in runs {
            let rect = match open.remove(&(first_col, last_col)) {
                Some((mut area, v)) if area.last_row + 1 == row && *v == *value => {
                    area.last_row = row;
                    area
                }
                previous => {
                    done.extend(previous);
                    Area::new(row, first_col, row, last_col)
                }
            };
            next_open.insert((first_col, last_col), (rect, value));
        }
        done.extend(open.drain().map(|(_, rect)| rect));
        open = next_open;
    }
    done.extend(open.into_values());
    done
}

fn verify<V: Clone + PartialEq>(
    state: &EffectiveState<V>,
    declarations: &[Declaration<V>],
) -> Result<()> {
    let sheets = state.keys().map(|c| c.sheet + 1).max().unwrap_or(0);
    let mut extents = vec![SheetExtent::default(); sheets];
    for coord in state.keys() {
        let extent = &mut extents[coord.sheet];
        extent.rows = extent.rows.max(coord.row + 1);
        extent.cols = extent.cols.max(coord.col + 1);
    }

    let resolved = resolve(declarations, &extents)?;
    let expected = state.iter().filter(|(_, attrs)| !attrs.is_empty());

    let mut actual = resolved.iter();
    for (coord, attrs) in expected {
        match actual.next() {
            Some((c, a)) if c == coord && a == attrs => {}
            Some((c, _)) if c == coord => {
                return Err(Error::CoalesceInvariantViolation(format!(
                    "attributes of {:?} differ after re-resolution",
                    coord
                )));
            }
            _ => {
                return Err(Error::CoalesceInvariantViolation(format!(
                    "cell {:?} lost or displaced after re-resolution",
                    coord
                )));
            }
        }
    }
    if let Some((extra, _)) = actual.next() {
        return Err(Error::CoalesceInvariantViolation(format!(
            "cell {:?} gained attributes after re-resolution",
            extra
        )));
    }
    Ok(())
}
