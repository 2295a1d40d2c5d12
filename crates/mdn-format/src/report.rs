//! Validation findings collected alongside decoding

use std::fmt;

use serde::Serialize;

/// Errors and warnings found while reading a document
///
/// Errors fail validation; warnings are advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Section kinds present, in required order, each listed once
    pub sections_found: Vec<String>,
    /// Sheet names from the tabular sections, in document order
    pub sheet_names: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "validation error");
        self.errors.push(message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "validation warning");
        self.warnings.push(message);
    }

    /// Move every warning into the errors
    pub fn promote_warnings(&mut self) {
        self.errors.append(&mut self.warnings);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", if self.is_valid() { "valid" } else { "invalid" })?;
        for error in &self.errors {
            writeln!(f, "  error: {}", error)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  warning: {}", warning)?;
        }
        Ok(())
    }
}
