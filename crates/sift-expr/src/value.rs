//! Record field access.
//!
//! Compiled expressions never reach into records by reflection. A record
//! exposes its fields through the [`Record`] trait, and each field is seen as
//! a [`Value`] with a text form, an optional numeric form and an optional
//! date form.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::date;

/// A field value as seen by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// Text, borrowed from the record where possible.
    Text(Cow<'a, str>),
    /// A number.
    Number(f64),
    /// A boolean.
    Bool(bool),
}

impl<'a> Value<'a> {
    /// Creates a text value.
    pub fn text(s: impl Into<Cow<'a, str>>) -> Self {
        Value::Text(s.into())
    }

    /// Returns the text form of the value.
    ///
    /// Integral numbers are printed without a fractional part, so `1.0`
    /// reads as `"1"`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s.as_ref()),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }

    /// Returns the numeric form of the value, if it has one.
    ///
    /// Text is trimmed and parsed; booleans are never numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            Value::Number(_) => None,
            Value::Text(s) => parse_number(s),
            Value::Bool(_) => None,
        }
    }

    /// Returns the date form of the value, if its text is a recognised date.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Text(s) => date::parse(s),
            _ => None,
        }
    }

    /// Converts into a value that owns its data.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Number(n) => Value::Number(n),
            Value::Bool(b) => Value::Bool(b),
        }
    }
}

impl From<String> for Value<'static> {
    fn from(s: String) -> Self {
        Value::Text(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Text(Cow::Borrowed(s))
    }
}

impl From<f64> for Value<'static> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value<'static> {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value<'static> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Parses a trimmed number. Empty text is not a number.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A record whose fields can be read by name.
///
/// Returns `None` when the field is absent. Absent fields fail every test.
pub trait Record {
    /// Returns the value of the named field.
    fn field(&self, name: &str) -> Option<Value<'_>>;
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        (**self).field(name)
    }
}

impl Record for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).map(|s| Value::from(s.as_str()))
    }
}

impl Record for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).map(|s| Value::from(s.as_str()))
    }
}

impl Record for HashMap<&str, &str> {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).map(|s| Value::from(*s))
    }
}

impl Record for HashMap<String, Value<'static>> {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).map(borrow_value)
    }
}

impl Record for BTreeMap<String, Value<'static>> {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).map(borrow_value)
    }
}

fn borrow_value<'a>(value: &'a Value<'static>) -> Value<'a> {
    match value {
        Value::Text(s) => Value::Text(Cow::Borrowed(s.as_ref())),
        Value::Number(n) => Value::Number(*n),
        Value::Bool(b) => Value::Bool(*b),
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        self.get(name).and_then(json_value)
    }
}

/// Only JSON objects have fields; every other JSON value is an empty record.
impl Record for serde_json::Value {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match self {
            serde_json::Value::Object(map) => map.field(name),
            _ => None,
        }
    }
}

fn json_value(value: &serde_json::Value) -> Option<Value<'_>> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
        serde_json::Value::String(s) => Some(Value::from(s.as_str())),
        nested @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
            Some(Value::from(nested.to_string()))
        }
    }
}
