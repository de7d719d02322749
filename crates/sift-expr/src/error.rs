//! Error and diagnostic types for the criteria compiler.

use serde::Serialize;
use thiserror::Error;

/// A specialized Result type for strict compilation.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors reported by strict compilation.
///
/// Lenient compilation never fails; the same conditions are recorded as
/// [`Diagnostic`]s on the compiled expression instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A segment did not split into exactly one key and one value.
    #[error("malformed segment: '{segment}' (expected key:value)")]
    MalformedSegment {
        /// The raw segment text.
        segment: String,
    },

    /// A numeric range bound could not be parsed.
    #[error("invalid range bound '{bound}' for key '{key}'")]
    InvalidRangeBound {
        /// The key the range applies to.
        key: String,
        /// The offending bound.
        bound: String,
    },

    /// A date or date-range operand could not be parsed.
    #[error("invalid date '{value}' for key '{key}'")]
    InvalidDate {
        /// The key the date applies to.
        key: String,
        /// The offending date text.
        value: String,
    },
}

impl FilterError {
    /// Creates a malformed segment error.
    pub fn malformed_segment(segment: impl Into<String>) -> Self {
        FilterError::MalformedSegment {
            segment: segment.into(),
        }
    }

    /// Creates an invalid range bound error.
    pub fn invalid_range_bound(key: impl Into<String>, bound: impl Into<String>) -> Self {
        FilterError::InvalidRangeBound {
            key: key.into(),
            bound: bound.into(),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterError::InvalidDate {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Likely an authoring mistake; the expression still behaves predictably.
    Warning,
    /// Part of the expression can never match.
    Error,
}

/// An advisory message produced while compiling a criteria string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A segment was dropped because it was not `key:value`.
    MalformedSegment {
        /// The raw segment text.
        segment: String,
        /// Byte offset of the segment in the input.
        position: usize,
    },

    /// The same key appears in more than one segment. Both tests apply.
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// A numeric range bound is not a number; the range never matches.
    InvalidRangeBound {
        /// The key the range applies to.
        key: String,
        /// The offending bound.
        bound: String,
    },

    /// A date operand is not a recognised date; the test never matches.
    InvalidDate {
        /// The key the date applies to.
        key: String,
        /// The offending date text.
        value: String,
    },
}

impl Diagnostic {
    /// Returns the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MalformedSegment { .. } | Diagnostic::DuplicateKey { .. } => {
                Severity::Warning
            }
            Diagnostic::InvalidRangeBound { .. } | Diagnostic::InvalidDate { .. } => {
                Severity::Error
            }
        }
    }

    /// Returns true if this diagnostic has error severity.
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Converts this diagnostic into the error strict compilation would report.
    ///
    /// Duplicate keys are not errors, so they yield `None`.
    pub fn to_error(&self) -> Option<FilterError> {
        match self {
            Diagnostic::MalformedSegment { segment, .. } => {
                Some(FilterError::malformed_segment(segment.as_str()))
            }
            Diagnostic::DuplicateKey { .. } => None,
            Diagnostic::InvalidRangeBound { key, bound } => {
                Some(FilterError::invalid_range_bound(key.as_str(), bound.as_str()))
            }
            Diagnostic::InvalidDate { key, value } => {
                Some(FilterError::invalid_date(key.as_str(), value.as_str()))
            }
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedSegment { segment, position } => {
                write!(f, "dropped malformed segment '{segment}' at position {position}")
            }
            Diagnostic::DuplicateKey { key } => {
                write!(f, "duplicate key '{key}'; all of its tests must pass")
            }
            Diagnostic::InvalidRangeBound { key, bound } => {
                write!(f, "range bound '{bound}' for key '{key}' is not a number")
            }
            Diagnostic::InvalidDate { key, value } => {
                write!(f, "'{value}' for key '{key}' is not a date")
            }
        }
    }
}
