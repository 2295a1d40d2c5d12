//! Structured blocks: FORMULAS and FORMAT
//!
//! Both map reference strings to values, in document order. Bodies are JSON
//! objects unless the section's format token says YAML. Blocks tagged JSON
//! that only parse as YAML are accepted with a warning, since older writers
//! emitted YAML under the JSON tag.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};

use crate::attributes;
use crate::error::{FormatError, FormatResult};
use crate::report::ValidationReport;
use crate::section::{Section, SectionKind};
use mdn_core::{AttributeSet, Declaration, RangeReference, SheetScope, FORMULA_KEY};

/// Section attribute naming the sheet unqualified references bind to
pub const SHEET_ATTRIBUTE: &str = "sheet";

/// A parsed block body. Object entries keep their written order and
/// repeated keys.
enum Body {
    Entries(Vec<(String, Value)>),
    /// Anything but an object or null, named for diagnostics
    Other(&'static str),
}

struct BodyVisitor;

impl<'de> Visitor<'de> for BodyVisitor {
    type Value = Body;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of references")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Body, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Value>()? {
            entries.push(entry);
        }
        Ok(Body::Entries(entries))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Body, E> {
        Ok(Body::Entries(Vec::new()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Body, E> {
        Ok(Body::Entries(Vec::new()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Body, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Body::Other("a list"))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Body, E> {
        Ok(Body::Other("a boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Body, E> {
        Ok(Body::Other("a number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Body, E> {
        Ok(Body::Other("a number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Body, E> {
        Ok(Body::Other("a number"))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Body, E> {
        Ok(Body::Other("a string"))
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BodyVisitor)
    }
}

fn parse_body(section: &Section, report: &mut ValidationReport) -> FormatResult<Body> {
    let body = section.body_text();
    if section.format_is("YAML") {
        return Ok(serde_yaml::from_str(&body)?);
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(json_err) => match serde_yaml::from_str::<Body>(&body) {
            Ok(value) => {
                report.warning(format!(
                    "{} is tagged {} but holds YAML",
                    section.describe(),
                    section.format.as_deref().unwrap_or("JSON")
                ));
                Ok(value)
            }
            Err(_) => Err(FormatError::block(
                section.kind.token(),
                format!("{} at line {}", json_err, section.line + json_err.line()),
            )),
        },
    }
}

/// The scope unqualified references in `section` bind to
fn section_scope<'a>(section: &Section, names: &[&'a str]) -> FormatResult<SheetScope<'a>> {
    let scope = SheetScope::new(names.iter().copied());
    match section.attribute(SHEET_ATTRIBUTE) {
        None => Ok(scope),
        Some(name) => {
            let index = scope.index_of(name).ok_or_else(|| {
                FormatError::block(
                    section.kind.token(),
                    format!("{}={} names an undeclared sheet", SHEET_ATTRIBUTE, name),
                )
            })?;
            Ok(scope.with_current(index))
        }
    }
}

/// Read a structured block into declarations, in document order.
///
/// Malformed references abort; ill-typed values are reported and skipped.
/// A reference written twice yields two declarations, the later one winning
/// where their attributes overlap, and a warning.
pub fn read(
    section: &Section,
    sheet_names: &[&str],
    report: &mut ValidationReport,
) -> FormatResult<Vec<Declaration<Value>>> {
    if section.is_blank() {
        report.error(format!("{} is empty", section.describe()));
        return Ok(Vec::new());
    }

    let entries = match parse_body(section, report)? {
        Body::Entries(entries) => entries,
        Body::Other(found) => {
            return Err(FormatError::block(
                section.kind.token(),
                format!("expected an object, found {}", found),
            ))
        }
    };
    let scope = section_scope(section, sheet_names)?;

    let mut seen = HashSet::with_capacity(entries.len());
    let mut declarations = Vec::with_capacity(entries.len());
    for (text, value) in entries {
        let location = format!("{} '{}'", section.describe(), text);
        if !seen.insert(text.clone()) {
            report.warning(format!("{}: declared more than once", location));
        }
        let reference = RangeReference::parse(&text, &scope)
            .map_err(|source| FormatError::Reference {
                location: location.clone(),
                source,
            })?;

        match section.kind {
            SectionKind::Formulas => match value {
                Value::String(formula) => {
                    if !formula.starts_with('=') {
                        report.warning(format!("{}: formula should start with '='", location));
                    }
                    declarations.push(Declaration::single(
                        reference,
                        FORMULA_KEY,
                        Value::String(formula),
                    ));
                }
                other => report.error(format!(
                    "{}: formula must be a string, found {}",
                    location,
                    kind_name(&other)
                )),
            },
            _ => match value {
                Value::Object(map) => {
                    let attributes: AttributeSet<Value> = map.into_iter().collect();
                    if attributes.is_empty() {
                        report.warning(format!("{}: declares no attributes", location));
                    }
                    for problem in attributes::check(&attributes) {
                        report.warning(format!("{}: {}", location, problem));
                    }
                    declarations.push(Declaration::new(reference, attributes));
                }
                other => report.error(format!(
                    "{}: format must be an object, found {}",
                    location,
                    kind_name(&other)
                )),
            },
        }
    }

    tracing::trace!(
        section = %section.kind,
        declarations = declarations.len(),
        "read structured block"
    );
    Ok(declarations)
}

/// Build a structured section from declarations, qualifying every reference
/// with its sheet name. Formula declarations are written as plain strings.
pub fn write(
    kind: SectionKind,
    declarations: &[Declaration<Value>],
    sheet_names: &[&str],
) -> FormatResult<Section> {
    let mut map = Map::new();
    for declaration in declarations {
        let key = declaration.reference.display(sheet_names);
        let value = match kind {
            SectionKind::Formulas => declaration
                .attributes
                .get(FORMULA_KEY)
                .cloned()
                .unwrap_or(Value::Null),
            _ => Value::Object(
                declaration
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        };
        map.insert(key, value);
    }

    let body = serde_json::to_string_pretty(&Value::Object(map))?;
    Ok(Section::new(kind).with_body(&body))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
