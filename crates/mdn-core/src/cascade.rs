//! Cascade resolution: range declarations to per-cell attribute values
//!
//! Every declaration contributes one candidate per (cell, attribute key) it
//! covers. The effective value of a (cell, key) pair is the candidate with
//! the highest [`Precedence`]: specificity first, then declaration order,
//! later winning. Keys are resolved independently, so a narrow declaration
//! that sets only `color` leaves a broader `numberFormat` in place.

use std::collections::BTreeMap;

use crate::cell::CellCoordinate;
use crate::error::Result;
use crate::reference::{RangeReference, Specificity};
use crate::sheet::SheetExtent;

/// Named attribute values attached to a reference or a cell
pub type AttributeSet<V> = BTreeMap<String, V>;

/// Resolved attributes per cell. Cells without attributes are absent.
pub type EffectiveState<V> = BTreeMap<CellCoordinate, AttributeSet<V>>;

/// A (reference, attributes) pair as it appears in a structured block
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration<V> {
    pub reference: RangeReference,
    pub attributes: AttributeSet<V>,
}

impl<V> Declaration<V> {
    pub fn new(reference: RangeReference, attributes: AttributeSet<V>) -> Self {
        Self {
            reference,
            attributes,
        }
    }

    /// A declaration carrying a single attribute
    pub fn single<K: Into<String>>(reference: RangeReference, key: K, value: V) -> Self {
        let mut attributes = AttributeSet::new();
        attributes.insert(key.into(), value);
        Self::new(reference, attributes)
    }
}

/// Ordering key of a candidate: specificity, then declaration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence {
    pub specificity: Specificity,
    pub order: usize,
}

#[derive(Debug)]
struct Candidate<'a, V> {
    precedence: Precedence,
    value: &'a V,
}

/// Resolve declarations, in document order, against the sheets' extents
/// (indexed by sheet).
///
/// Declarations that cover no cells are inert. Fails only when a reference
/// has inverted bounds.
pub fn resolve<V: Clone>(
    declarations: &[Declaration<V>],
    extents: &[SheetExtent],
) -> Result<EffectiveState<V>> {
    let mut candidates: BTreeMap<CellCoordinate, BTreeMap<&str, Vec<Candidate<'_, V>>>> =
        BTreeMap::new();

    for (order, declaration) in declarations.iter().enumerate() {
        let precedence = Precedence {
            specificity: declaration.reference.specificity(),
            order,
        };
        let cells = declaration.reference.cells(extents)?;
        if declaration.attributes.is_empty() {
            continue;
        }

        for coord in cells {
            let slots = candidates.entry(coord).or_default();
            for (key, value) in &declaration.attributes {
                slots
                    .entry(key.as_str())
                    .or_default()
                    .push(Candidate { precedence, value });
            }
        }
    }

    tracing::trace!(
        declarations = declarations.len(),
        cells = candidates.len(),
        "resolved cascade"
    );

    Ok(candidates
        .into_iter()
        .map(|(coord, slots)| {
            let attributes = slots
                .into_iter()
                .filter_map(|(key, list)| {
                    list.into_iter()
                        .max_by_key(|c| c.precedence)
                        .map(|winner| (key.to_string(), winner.value.clone()))
                })
                .collect();
            (coord, attributes)
        })
        .collect())
}
