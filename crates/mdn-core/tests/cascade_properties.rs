//! Property tests for the resolve / coalesce pair
//!
//! Grids are kept small (two sheets, 6x6) so that shrinking stays readable.

use mdn_core::{
    coalesce, resolve, AttributeSet, CellAddress, CellCoordinate, Declaration, EffectiveState,
    RangeReference, SheetExtent, SheetScope,
};
use proptest::prelude::*;
use serde_json::{json, Value};

const SIZE: u32 = 6;

fn extents() -> Vec<SheetExtent> {
    vec![SheetExtent::new(SIZE, SIZE as u16); 2]
}

/// Random per-cell assignment over two keys and a three-value alphabet
fn arb_state() -> impl Strategy<Value = EffectiveState<Value>> {
    let cell = (
        0usize..2,
        0u32..SIZE,
        0u16..SIZE as u16,
        prop::option::of(0u8..3),
        prop::option::of(0u8..3),
    );
    prop::collection::vec(cell, 0..40).prop_map(|cells| {
        let mut state = EffectiveState::new();
        for (sheet, row, col, a, b) in cells {
            let mut attrs = AttributeSet::new();
            if let Some(a) = a {
                attrs.insert("a".to_string(), json!(a));
            }
            if let Some(b) = b {
                attrs.insert("b".to_string(), json!(b));
            }
            if !attrs.is_empty() {
                state.insert(CellCoordinate::new(sheet, row, col), attrs);
            }
        }
        state
    })
}

fn arb_cell() -> impl Strategy<Value = String> {
    (0u32..SIZE, 0u16..SIZE as u16)
        .prop_map(|(row, col)| CellAddress::new(row, col).to_a1_string())
}

/// Random reference text in any of the syntactic shapes
fn arb_reference() -> impl Strategy<Value = String> {
    let body = prop_oneof![
        arb_cell(),
        (arb_cell(), arb_cell()).prop_map(|(a, b)| {
            let a = CellAddress::parse(&a).unwrap();
            let b = CellAddress::parse(&b).unwrap();
            let start = CellAddress::new(a.row.min(b.row), a.col.min(b.col));
            let end = CellAddress::new(a.row.max(b.row), a.col.max(b.col));
            format!("{}:{}", start, end)
        }),
        (0u16..SIZE as u16).prop_map(|c| CellAddress::column_to_letters(c)),
        (1u32..=SIZE).prop_map(|r| format!("{}:{}", r, r)),
        Just("*".to_string()),
        prop::collection::vec(arb_cell(), 2..4).prop_map(|cells| cells.join(",")),
    ];
    (prop::option::of(prop_oneof![Just("S!"), Just("T!")]), body)
        .prop_map(|(sheet, body)| format!("{}{}", sheet.unwrap_or(""), body))
}

fn arb_declarations() -> impl Strategy<Value = Vec<Declaration<Value>>> {
    let decl = (arb_reference(), prop::sample::select(vec!["a", "b"]), 0u8..3);
    prop::collection::vec(decl, 0..8).prop_map(|decls| {
        let scope = SheetScope::new(["S", "T"]);
        decls
            .into_iter()
            .map(|(text, key, value)| {
                let reference = RangeReference::parse(&text, &scope).unwrap();
                Declaration::single(reference, key, json!(value))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn coalesce_reproduces_any_assignment(state in arb_state()) {
        let declarations = coalesce(&state).unwrap();
        let resolved = resolve(&declarations, &extents()).unwrap();
        prop_assert_eq!(resolved, state);
    }

    #[test]
    fn coalesce_is_idempotent(state in arb_state()) {
        let once = coalesce(&state).unwrap();
        let twice = coalesce(&resolve(&once, &extents()).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn coalesced_rectangles_never_overlap_per_key(state in arb_state()) {
        let declarations = coalesce(&state).unwrap();
        for key in ["a", "b"] {
            let mut seen = std::collections::BTreeSet::new();
            for decl in declarations.iter().filter(|d| d.attributes.contains_key(key)) {
                for cell in decl.reference.resolve(&extents()).unwrap() {
                    prop_assert!(seen.insert(cell), "{:?} covered twice for '{}'", cell, key);
                }
            }
        }
    }

    #[test]
    fn declarations_survive_coalescing(declarations in arb_declarations()) {
        let state = resolve(&declarations, &extents()).unwrap();
        let rebuilt = coalesce(&state).unwrap();
        prop_assert_eq!(resolve(&rebuilt, &extents()).unwrap(), state);
    }

    #[test]
    fn single_cell_wins_regardless_of_position(
        broad in arb_reference(),
        cell in arb_cell(),
        cell_first in any::<bool>(),
    ) {
        let scope = SheetScope::new(["S", "T"]);
        let broad = RangeReference::parse(&broad, &scope).unwrap();
        let target = RangeReference::parse(&cell, &scope).unwrap();
        prop_assume!(broad.specificity() < target.specificity());

        let narrow = Declaration::single(target.clone(), "a", json!("narrow"));
        let wide = Declaration::single(broad, "a", json!("wide"));
        let declarations = if cell_first { vec![narrow, wide] } else { vec![wide, narrow] };

        let state = resolve(&declarations, &extents()).unwrap();
        let coord = target.resolve(&extents()).unwrap()[0];
        prop_assert_eq!(&state[&coord]["a"], &json!("narrow"));
    }
}

#[test]
fn empty_assignment_coalesces_to_nothing() {
    let state: EffectiveState<Value> = EffectiveState::new();
    assert!(coalesce(&state).unwrap().is_empty());
}
