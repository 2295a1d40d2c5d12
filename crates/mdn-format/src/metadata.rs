//! The metadata (HEADER) block
//!
//! A YAML mapping with `source`, `version`, `created` and `sheets`, plus
//! an optional context mapping in the reopened part of the section.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{FormatError, FormatResult};
use crate::report::ValidationReport;
use crate::section::{Section, SectionKind};
use mdn_core::WorkbookProperties;

pub const SOURCE: &str = "source";
pub const VERSION: &str = "version";
pub const CREATED: &str = "created";
pub const SHEETS: &str = "sheets";

const REQUIRED: [&str; 4] = [SOURCE, VERSION, CREATED, SHEETS];

/// First line of the context part as written
pub const CONTEXT_MARKER: &str = "# optional context section";

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("version pattern is valid"));

/// Decoded metadata block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub properties: WorkbookProperties,
    /// The `sheets` list, when it is a list of strings
    pub sheets: Option<Vec<String>>,
}

/// Parse YAML text into a JSON value; blank text is `null`
fn parse_yaml(text: &str) -> FormatResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Render a scalar the way it reads in the document
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read the metadata section, recording findings in `report`.
///
/// Fails only when the block is not a YAML mapping.
pub fn read(section: &Section, report: &mut ValidationReport) -> FormatResult<Metadata> {
    let body = section.body_text();
    if section.is_blank() {
        report.error("metadata block is empty");
    }

    let map = match parse_yaml(&body).map_err(|e| FormatError::InvalidMetadata(e.to_string()))? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(FormatError::InvalidMetadata(format!(
                "expected a mapping, found {}",
                other
            )))
        }
    };

    for key in REQUIRED {
        if !map.contains_key(key) {
            report.error(format!("missing required metadata field '{}'", key));
        }
    }

    let mut metadata = Metadata::default();
    let properties = &mut metadata.properties;
    for (key, value) in map {
        match key.as_str() {
            SOURCE => match scalar_text(&value) {
                Some(source) => properties.source = source,
                None => report.error(format!("'{}' must be a string", SOURCE)),
            },
            VERSION => match scalar_text(&value) {
                Some(version) => {
                    if !VERSION_PATTERN.is_match(&version) {
                        report.warning(format!(
                            "version '{}' should look like 1.0 or 1.0.0",
                            version
                        ));
                    }
                    properties.version = version;
                }
                None => report.error(format!("'{}' must be a string", VERSION)),
            },
            CREATED => properties.created = scalar_text(&value),
            SHEETS => metadata.sheets = read_sheet_list(&value, report),
            _ => {
                report.warning(format!("unknown metadata field '{}' passed through", key));
                properties.extra.insert(key, value);
            }
        }
    }

    if let Some(text) = section.continuation_text() {
        match parse_yaml(&text) {
            Ok(Value::Object(context)) => metadata.properties.context = context,
            Ok(Value::Null) => {}
            Ok(other) => report.warning(format!(
                "context part should be a mapping, found {}; ignored",
                other
            )),
            Err(e) => report.warning(format!("context part is not valid YAML ({}); ignored", e)),
        }
    }

    Ok(metadata)
}

fn read_sheet_list(value: &Value, report: &mut ValidationReport) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        report.error(format!("'{}' must be a list", SHEETS));
        return None;
    };
    if items.is_empty() {
        report.error(format!("'{}' list cannot be empty", SHEETS));
    }

    let mut names: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = scalar_text(item) else {
            report.error(format!("'{}' entries must be names, found {}", SHEETS, item));
            return None;
        };
        if names.contains(&name) {
            report.error(format!("duplicate sheet name '{}' in metadata", name));
        }
        names.push(name);
    }
    Some(names)
}

/// Build the metadata section for a workbook
pub fn write(
    properties: &WorkbookProperties,
    sheet_names: &[&str],
    created: &str,
    emit_context: bool,
) -> FormatResult<Section> {
    let mut map = Map::new();
    map.insert(SOURCE.into(), Value::String(properties.source.clone()));
    map.insert(VERSION.into(), Value::String(properties.version.clone()));
    map.insert(CREATED.into(), Value::String(created.to_string()));
    map.insert(
        SHEETS.into(),
        Value::Array(
            sheet_names
                .iter()
                .map(|n| Value::String(n.to_string()))
                .collect(),
        ),
    );
    for (key, value) in &properties.extra {
        if !REQUIRED.contains(&key.as_str()) {
            map.insert(key.clone(), value.clone());
        }
    }

    let mut section = Section::new(SectionKind::Header).with_body(&serde_yaml::to_string(&map)?);
    if emit_context && !properties.context.is_empty() {
        let mut lines = vec![CONTEXT_MARKER.to_string()];
        lines.extend(
            serde_yaml::to_string(&properties.context)?
                .lines()
                .map(str::to_string),
        );
        section.continuation = Some(lines);
    }
    Ok(section)
}
