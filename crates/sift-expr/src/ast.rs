//! Compiled representation of criteria strings.

use chrono::NaiveDateTime;
use serde::Serialize;

/// The key segment of a clause.
///
/// The raw text is kept for diagnostics. A comma-joined key names several
/// fields; only the search operator reads more than one of them, every other
/// operator looks up the raw key as a single field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldKey {
    raw: String,
    names: Vec<String>,
}

impl FieldKey {
    /// Creates a key from its raw segment text.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let names = raw.split(',').map(str::to_string).collect();
        Self { raw, names }
    }

    /// Returns the key exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the comma-separated field names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A subsequence pattern for fuzzy and search matching.
///
/// Stores the lower-cased pattern characters. Text matches when it contains
/// those characters in order with anything in between.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FuzzyPattern {
    source: String,
    #[serde(skip)]
    chars: Vec<char>,
}

impl FuzzyPattern {
    /// Creates a pattern from its source text.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let chars = source.chars().flat_map(char::to_lowercase).collect();
        Self { source, chars }
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `text` contains the pattern as a case-insensitive subsequence.
    pub fn is_match(&self, text: &str) -> bool {
        let mut wanted = self.chars.iter().peekable();
        for c in text.chars().flat_map(char::to_lowercase) {
            match wanted.peek() {
                Some(&&w) if w == c => {
                    wanted.next();
                }
                Some(_) => {}
                None => return true,
            }
        }
        wanted.peek().is_none()
    }
}

/// The test applied to a record for one clause.
///
/// Bounds and comparison dates that failed to parse are stored as `None`;
/// such tests never match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Test {
    /// Case-insensitive equality with the field's text form.
    Exact {
        /// The lower-cased comparison text.
        expected: String,
    },

    /// Logical negation of another test.
    Not {
        /// The negated test.
        inner: Box<Test>,
    },

    /// The field, read as a date, is the same instant as `date`.
    DateEquals {
        /// The comparison date.
        date: Option<NaiveDateTime>,
    },

    /// The field, read as a date, lies within `[low, high]`.
    DateRange {
        /// Inclusive lower bound.
        low: Option<NaiveDateTime>,
        /// Inclusive upper bound.
        high: Option<NaiveDateTime>,
    },

    /// The field, read as a number, lies within `[low, high]`.
    NumberRange {
        /// Inclusive lower bound.
        low: Option<f64>,
        /// Inclusive upper bound.
        high: Option<f64>,
    },

    /// The field's text contains the pattern as a subsequence.
    Fuzzy {
        /// The pattern.
        pattern: FuzzyPattern,
    },

    /// Any of the key's fields contains the pattern as a subsequence.
    Search {
        /// The pattern.
        pattern: FuzzyPattern,
    },
}

impl Test {
    /// Creates an exact test.
    pub fn exact(expected: &str) -> Self {
        Test::Exact {
            expected: expected.to_lowercase(),
        }
    }

    /// Creates a NOT test from another test.
    ///
    /// # Example
    ///
    /// ```
    /// use sift_expr_rs::Test;
    ///
    /// let test = Test::negate(Test::exact("1"));
    /// assert!(matches!(test, Test::Not { .. }));
    /// ```
    pub fn negate(inner: Test) -> Self {
        Test::Not {
            inner: Box::new(inner),
        }
    }

    /// Creates a fuzzy test.
    pub fn fuzzy(pattern: &str) -> Self {
        Test::Fuzzy {
            pattern: FuzzyPattern::new(pattern),
        }
    }

    /// Creates a multi-field search test.
    pub fn search(pattern: &str) -> Self {
        Test::Search {
            pattern: FuzzyPattern::new(pattern),
        }
    }

    /// Returns a short operator name, used in diagnostics and CLI output.
    pub fn operator(&self) -> &'static str {
        match self {
            Test::Exact { .. } => "exact",
            Test::Not { .. } => "not",
            Test::DateEquals { .. } => "date",
            Test::DateRange { .. } => "date_range",
            Test::NumberRange { .. } => "range",
            Test::Fuzzy { .. } => "fuzzy",
            Test::Search { .. } => "search",
        }
    }
}

/// One compiled `key:value` segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    /// The key the test reads.
    pub key: FieldKey,
    /// The test.
    pub test: Test,
}

impl Clause {
    /// Creates a clause.
    pub fn new(key: FieldKey, test: Test) -> Self {
        Self { key, test }
    }
}
