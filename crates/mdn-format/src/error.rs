//! MDN format error types

use thiserror::Error;

/// Result type for MDN format operations
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// Errors that can occur while decoding or encoding an MDN document
#[derive(Debug, Error)]
pub enum FormatError {
    /// Broken delimiter structure; `line` is 1-based
    #[error("Malformed section at line {line}: {message}")]
    MalformedSection { line: usize, message: String },

    /// Sections out of the required order, or repeated when they may not be
    #[error("Section order violation at line {line}: {message}")]
    OrderViolation { line: usize, message: String },

    /// A required section is absent
    #[error("Missing required section: {0}")]
    MissingSection(String),

    /// The metadata block is not a usable mapping
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// A structured block has the wrong shape
    #[error("Invalid {section} block: {message}")]
    InvalidBlock { section: String, message: String },

    /// A declaration's reference failed to parse or resolve
    #[error("{location}: {source}")]
    Reference {
        location: String,
        #[source]
        source: mdn_core::Error,
    },

    /// A tabular block failed to parse
    #[error("Sheet '{sheet}': {source}")]
    Tabular {
        sheet: String,
        #[source]
        source: mdn_csv::CsvError,
    },

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] mdn_core::Error),
}

impl FormatError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        FormatError::MalformedSection {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn order(line: usize, message: impl Into<String>) -> Self {
        FormatError::OrderViolation {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn block(section: &str, message: impl Into<String>) -> Self {
        FormatError::InvalidBlock {
            section: section.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error comes from the delimiter structure rather than a
    /// block's content
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FormatError::MalformedSection { .. }
                | FormatError::OrderViolation { .. }
                | FormatError::MissingSection(_)
        )
    }
}
