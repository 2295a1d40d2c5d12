//! Section grammar: the outer delimiter structure of an MDN document
//!
//! ```text
//! --- MDN:HEADER YAML
//! source: budget.xlsx
//! ---
//! # optional context section
//! purpose: planning
//! ---
//! --- MDN:SHEET CSV name=Revenue
//! Month,Revenue
//! ---
//! --- MDN:FORMULAS JSON
//! {}
//! ---
//! END DOCUMENT
//! ```
//!
//! Lines are classified by shape only, in one pass. Bodies are kept as raw
//! lines and never interpreted here, except that a body line which would
//! read as a delimiter is written with a leading `\` and read back without it.

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FormatError, FormatResult};

/// Namespace of every section this crate understands
pub const NAMESPACE: &str = "MDN";

/// Line that closes a section
pub const CLOSE_DELIMITER: &str = "---";

/// Line that terminates a document
pub const END_MARKER: &str = "END DOCUMENT";

static OPEN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^---[ \t]+([A-Za-z][A-Za-z0-9_]*):([A-Za-z][A-Za-z0-9_]*)(?:[ \t]+(.*))?$")
        .expect("open delimiter pattern is valid")
});

/// Section kinds, in their required document order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `MDN:HEADER`: YAML metadata, required and first
    Header,
    /// `MDN:SHEET`: one tabular block per sheet
    Sheet,
    /// `MDN:FORMULAS`: structured formula declarations, required
    Formulas,
    /// `MDN:FORMAT`: structured formatting declarations
    Format,
    /// `MDN:AI_PROMPT`: free-text guidance
    Prompt,
    /// Anything else, carried through untouched. Holds the `NS:KIND` token.
    Unknown(String),
}

impl SectionKind {
    /// Every kind this crate understands, in required order
    pub const KNOWN: [SectionKind; 5] = [
        SectionKind::Header,
        SectionKind::Sheet,
        SectionKind::Formulas,
        SectionKind::Format,
        SectionKind::Prompt,
    ];

    fn from_tokens(namespace: &str, kind: &str) -> Self {
        if namespace != NAMESPACE {
            return SectionKind::Unknown(format!("{}:{}", namespace, kind));
        }
        match kind {
            "HEADER" => SectionKind::Header,
            "SHEET" => SectionKind::Sheet,
            "FORMULAS" => SectionKind::Formulas,
            "FORMAT" => SectionKind::Format,
            "AI_PROMPT" => SectionKind::Prompt,
            other => SectionKind::Unknown(format!("{}:{}", namespace, other)),
        }
    }

    /// The `NS:KIND` token as written on the open delimiter
    pub fn token(&self) -> &str {
        match self {
            SectionKind::Header => "MDN:HEADER",
            SectionKind::Sheet => "MDN:SHEET",
            SectionKind::Formulas => "MDN:FORMULAS",
            SectionKind::Format => "MDN:FORMAT",
            SectionKind::Prompt => "MDN:AI_PROMPT",
            SectionKind::Unknown(token) => token,
        }
    }

    /// Position in the required order; unknown kinds are unordered
    pub fn rank(&self) -> Option<u8> {
        match self {
            SectionKind::Header => Some(0),
            SectionKind::Sheet => Some(1),
            SectionKind::Formulas => Some(2),
            SectionKind::Format => Some(3),
            SectionKind::Prompt => Some(4),
            SectionKind::Unknown(_) => None,
        }
    }

    /// Format token written when a section of this kind is created
    pub fn default_format(&self) -> Option<&'static str> {
        match self {
            SectionKind::Header => Some("YAML"),
            SectionKind::Sheet => Some("CSV"),
            SectionKind::Formulas | SectionKind::Format => Some("JSON"),
            SectionKind::Prompt | SectionKind::Unknown(_) => None,
        }
    }

    pub fn is_repeatable(&self) -> bool {
        matches!(self, SectionKind::Sheet | SectionKind::Unknown(_))
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            SectionKind::Header | SectionKind::Sheet | SectionKind::Formulas
        )
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One delimited section of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    /// Body syntax token, e.g. `CSV`, `JSON`, `YAML`
    pub format: Option<String>,
    /// `key=value` attributes in written order
    pub attributes: Vec<(String, String)>,
    /// Body lines, without terminators
    pub body: Vec<String>,
    /// Lines of the reopened part of the metadata section
    pub continuation: Option<Vec<String>>,
    /// 1-based line of the open delimiter; 0 for sections built in code
    pub line: usize,
}

impl Section {
    /// Create a section with the kind's default format token
    pub fn new(kind: SectionKind) -> Self {
        let format = kind.default_format().map(str::to_string);
        Self {
            kind,
            format,
            attributes: Vec::new(),
            body: Vec::new(),
            continuation: None,
            line: 0,
        }
    }

    /// Builder: add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder: set the body from text
    pub fn with_body(mut self, text: &str) -> Self {
        self.body = split_body(text);
        self
    }

    /// Get the first attribute named `key`
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The `name=` attribute of a tabular section
    pub fn name(&self) -> Option<&str> {
        self.attribute("name")
    }

    /// Whether the format token says `fmt`, ignoring case
    pub fn format_is(&self, fmt: &str) -> bool {
        self.format
            .as_deref()
            .map_or(false, |f| f.eq_ignore_ascii_case(fmt))
    }

    /// Body lines joined with `\n`
    pub fn body_text(&self) -> String {
        self.body.join("\n")
    }

    /// Continuation lines joined with `\n`
    pub fn continuation_text(&self) -> Option<String> {
        self.continuation.as_ref().map(|lines| lines.join("\n"))
    }

    /// Whether the body holds only blank lines
    pub fn is_blank(&self) -> bool {
        self.body.iter().all(|l| l.trim().is_empty())
    }

    /// Location string used in diagnostics
    pub fn describe(&self) -> String {
        let mut out = self.kind.token().to_string();
        if let Some(name) = self.name() {
            out.push_str(&format!(" name={}", name));
        }
        if self.line > 0 {
            out.push_str(&format!(" (line {})", self.line));
        }
        out
    }

    fn open_line(&self) -> String {
        let mut line = format!("{} {}", CLOSE_DELIMITER, self.kind.token());
        if let Some(format) = &self.format {
            line.push(' ');
            line.push_str(format);
        }
        for (key, value) in &self.attributes {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&quote_attribute(value));
        }
        line
    }
}

/// Split text into body lines; empty text is an empty body
fn split_body(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.trim_end_matches('\n')
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

/// Prefix that keeps a delimiter-shaped body line inside its section
pub const LINE_ESCAPE: char = '\\';

/// Whether `line`, stripped of leading escapes, would read as a delimiter
fn is_delimiter_shaped(line: &str) -> bool {
    let bare = line.trim_start_matches(LINE_ESCAPE).trim_end();
    bare.starts_with(CLOSE_DELIMITER) || bare == END_MARKER
}

/// Escape a body line so it cannot open, close or end anything.
///
/// A line gains one leading `\` when it is delimiter-shaped once its own
/// leading `\` run is ignored, so [`unescape_line`] can always undo it.
pub fn escape_line(line: &str) -> Cow<'_, str> {
    if is_delimiter_shaped(line) {
        Cow::Owned(format!("{}{}", LINE_ESCAPE, line))
    } else {
        Cow::Borrowed(line)
    }
}

/// Undo [`escape_line`]
pub fn unescape_line(line: &str) -> &str {
    match line.strip_prefix(LINE_ESCAPE) {
        Some(rest) if is_delimiter_shaped(rest) => rest,
        _ => line,
    }
}

/// How a single line reads, by shape alone
enum Line<'a> {
    Open(&'a str),
    Close,
    End,
    Blank,
    Body,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim_end();
    if trimmed == CLOSE_DELIMITER {
        Line::Close
    } else if trimmed == END_MARKER {
        Line::End
    } else if trimmed.starts_with(CLOSE_DELIMITER) {
        Line::Open(trimmed)
    } else if trimmed.is_empty() {
        Line::Blank
    } else {
        Line::Body
    }
}

fn open_section(text: &str, line: usize) -> FormatResult<Section> {
    let caps = OPEN_LINE
        .captures(text)
        .ok_or_else(|| FormatError::malformed(line, format!("unrecognized delimiter '{}'", text)))?;

    let kind = SectionKind::from_tokens(&caps[1], &caps[2]);
    let mut format = None;
    let mut attributes = Vec::new();
    if let Some(rest) = caps.get(3) {
        for (i, token) in tokenize(rest.as_str(), line)?.into_iter().enumerate() {
            match token {
                Token::Bare(word) if i == 0 => format = Some(word),
                Token::Bare(word) => {
                    return Err(FormatError::malformed(
                        line,
                        format!("expected key=value, found '{}'", word),
                    ))
                }
                Token::Pair(key, value) => attributes.push((key, value)),
            }
        }
    }

    Ok(Section {
        kind,
        format,
        attributes,
        body: Vec::new(),
        continuation: None,
        line,
    })
}

enum Token {
    Bare(String),
    Pair(String, String),
}

/// Split the delimiter tail into words and `key=value` pairs. Values may be
/// double-quoted with `\"` and `\\` escapes.
fn tokenize(text: &str, line: usize) -> FormatResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Ok(tokens);
        }

        let mut word = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            word.push(c);
        }
        if chars.next_if_eq(&'=').is_none() {
            tokens.push(Token::Bare(word));
            continue;
        }
        if word.is_empty() {
            return Err(FormatError::malformed(line, "attribute without a key"));
        }

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(c) => value.push(c),
                        None => break,
                    },
                    Some(c) => value.push(c),
                    None => {
                        return Err(FormatError::malformed(
                            line,
                            format!("unterminated quoted value for '{}'", word),
                        ))
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        tokens.push(Token::Pair(word, value));
    }
}

fn quote_attribute(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

enum State {
    /// Between sections; `reopen` is set right after the metadata section closes
    Outside { reopen: bool },
    Inside { section: Section, continuing: bool },
    Ended,
}

/// Split a document into sections, checking delimiter structure only.
///
/// Section order is not checked; see [`check_order`].
pub fn scan(text: &str) -> FormatResult<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();
    let mut state = State::Outside { reopen: false };
    let mut last_line = 0;

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        last_line = number;
        let line = raw.trim_end_matches('\r');

        state = match (state, classify(line)) {
            (State::Ended, Line::Blank) => State::Ended,
            (State::Ended, _) => {
                return Err(FormatError::malformed(number, "content after END DOCUMENT"))
            }

            (State::Outside { reopen }, Line::Blank) => State::Outside { reopen },
            (State::Outside { .. }, Line::Open(open)) => State::Inside {
                section: open_section(open, number)?,
                continuing: false,
            },
            (State::Outside { .. }, Line::Close) => {
                return Err(FormatError::malformed(
                    number,
                    "close delimiter outside any section",
                ))
            }
            (State::Outside { .. }, Line::End) => State::Ended,
            (State::Outside { reopen: true }, Line::Body) => {
                // The metadata section is closed once, then its context part follows
                let Some(mut section) = sections.pop() else {
                    return Err(FormatError::malformed(number, "content outside any section"));
                };
                section.continuation = Some(vec![line.to_string()]);
                State::Inside {
                    section,
                    continuing: true,
                }
            }
            (State::Outside { reopen: false }, Line::Body) => {
                return Err(FormatError::malformed(number, "content outside any section"))
            }

            (State::Inside { section, .. }, Line::Open(_)) => {
                return Err(FormatError::malformed(
                    number,
                    format!(
                        "open delimiter inside {} opened at line {}",
                        section.kind, section.line
                    ),
                ))
            }
            (State::Inside { section, .. }, Line::End) => {
                return Err(FormatError::malformed(
                    number,
                    format!(
                        "{} opened at line {} is not closed before END DOCUMENT",
                        section.kind, section.line
                    ),
                ))
            }
            (State::Inside { section, continuing }, Line::Close) => {
                let reopen = section.kind == SectionKind::Header && !continuing;
                sections.push(section);
                State::Outside { reopen }
            }
            (State::Inside { mut section, continuing }, Line::Blank | Line::Body) => {
                let target = match (&mut section.continuation, continuing) {
                    (Some(lines), true) => lines,
                    _ => &mut section.body,
                };
                target.push(unescape_line(line).to_string());
                State::Inside {
                    section,
                    continuing,
                }
            }
        };
    }

    match state {
        State::Ended => Ok(sections),
        State::Inside { section, .. } => Err(FormatError::malformed(
            last_line,
            format!(
                "{} opened at line {} is never closed",
                section.kind, section.line
            ),
        )),
        State::Outside { .. } => Err(FormatError::malformed(
            last_line,
            format!("missing '{}' marker", END_MARKER),
        )),
    }
}

/// Check section order and presence, reporting every violation found.
///
/// Unknown kinds may appear anywhere.
pub fn check_order(sections: &[Section]) -> Vec<FormatError> {
    let mut problems = Vec::new();
    let mut highest: Option<(u8, &Section)> = None;
    let mut seen: Vec<&SectionKind> = Vec::new();

    for section in sections {
        let Some(rank) = section.kind.rank() else {
            continue;
        };

        if !section.kind.is_repeatable() && seen.contains(&&section.kind) {
            problems.push(FormatError::order(
                section.line,
                format!("{} appears more than once", section.kind),
            ));
        } else if let Some((_, before)) = highest.filter(|(top, _)| rank < *top) {
            problems.push(FormatError::order(
                section.line,
                format!("{} appears after {}", section.kind, before.kind),
            ));
        }

        if highest.map_or(true, |(top, _)| rank > top) {
            highest = Some((rank, section));
        }
        seen.push(&section.kind);
    }

    for kind in SectionKind::KNOWN.iter().filter(|k| k.is_required()) {
        if !seen.contains(&kind) {
            problems.push(FormatError::MissingSection(kind.token().to_string()));
        }
    }

    problems
}

/// Parse a document into sections, failing on the first structural problem
pub fn parse(text: &str) -> FormatResult<Vec<Section>> {
    let sections = scan(text)?;
    if let Some(problem) = check_order(&sections).into_iter().next() {
        return Err(problem);
    }
    tracing::trace!(sections = sections.len(), "parsed section grammar");
    Ok(sections)
}

/// Serialize sections into a document ending with the end marker
pub fn serialize(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        out.push_str(&section.open_line());
        out.push('\n');
        for line in &section.body {
            out.push_str(&escape_line(line));
            out.push('\n');
        }
        out.push_str(CLOSE_DELIMITER);
        out.push('\n');
        if let Some(lines) = &section.continuation {
            for line in lines {
                out.push_str(&escape_line(line));
                out.push('\n');
            }
            out.push_str(CLOSE_DELIMITER);
            out.push('\n');
        }
    }
    out.push_str(END_MARKER);
    out.push('\n');
    out
}
