//! Recognized formatting attributes
//!
//! Keys outside this set are opaque and pass through unchanged.

use mdn_core::AttributeSet;
use serde_json::Value;

pub const NUMBER_FORMAT: &str = "numberFormat";
pub const BOLD: &str = "bold";
pub const ITALIC: &str = "italic";
pub const COLOR: &str = "color";
pub const THEME: &str = "theme";

/// The recognized attribute keys
pub const RECOGNIZED: [&str; 5] = [NUMBER_FORMAT, BOLD, ITALIC, COLOR, THEME];

/// Check a `#RRGGBB` or `AARRGGBB` hex color, with or without `#`
pub fn is_hex_color(text: &str) -> bool {
    let hex = text.trim_start_matches('#');
    matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Describe every problem with one attribute set, keyed by the attribute
pub fn check(attributes: &AttributeSet<Value>) -> Vec<String> {
    let mut problems = Vec::new();
    for (key, value) in attributes {
        let expected = match key.as_str() {
            NUMBER_FORMAT if !value.is_string() => "a string",
            BOLD | ITALIC if !value.is_boolean() => "a boolean",
            COLOR if !value.as_str().map_or(false, is_hex_color) => "a hex color like #1F4E79",
            THEME if !(value.is_u64() || value.is_i64()) => "an integer",
            k if !RECOGNIZED.contains(&k) => {
                problems.push(format!("unrecognized attribute '{}'", key));
                continue;
            }
            _ => continue,
        };
        problems.push(format!("'{}' should be {}, found {}", key, expected, value));
    }
    problems
}
