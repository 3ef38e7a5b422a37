// Copyright (C) 2025-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-udp.
//
// gelf-udp is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-udp is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-udp.  If not,
// see <http://www.gnu.org/licenses/>.

//! Raw log input classification.
//!
//! The client accepts more or less anything: a line of text, a number, a structured record, a
//! caught error, an array of who-knows-what. Rather than scatter type inspection through the
//! normalization pipeline, the input is classified exactly once, at the boundary, into the
//! [`LogInput`] variant; each pipeline step then matches on the tag.
//!
//! [`CaughtError`] deserves a word. The original wire consumers expect error-shaped records
//! (`message`, `stack`, arbitrary extra properties), so we snapshot a caught
//! [`std::error::Error`] into an owned value at the call site, capturing a backtrace while the
//! call stack is still interesting.

use backtrace::Backtrace;

use serde_json::Value;

/// An error caught by the application, snapshotted into an owned, transportable value.
#[derive(Clone, Debug, PartialEq)]
pub struct CaughtError {
    /// Error class name; `"Error"` when nothing better is known.
    pub name: String,
    pub message: String,
    /// Formatted backtrace, captured at construction.
    pub stack: String,
    /// Additional properties to ship alongside `message` & `stack`.
    pub properties: Vec<(String, Value)>,
}

impl CaughtError {
    /// Capture `err` along with a backtrace taken here & now.
    pub fn new<E: std::error::Error + ?Sized>(err: &E) -> CaughtError {
        CaughtError {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: format!("{:?}", Backtrace::new()),
            properties: Vec::new(),
        }
    }

    /// Capture a bare message where no [`std::error::Error`] value is at hand.
    pub fn from_message<S: Into<String>>(message: S) -> CaughtError {
        CaughtError {
            name: "Error".to_string(),
            message: message.into(),
            stack: format!("{:?}", Backtrace::new()),
            properties: Vec::new(),
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> CaughtError {
        self.name = name.into();
        self
    }

    pub fn with_property<S: Into<String>, V: Into<Value>>(mut self, key: S, value: V) -> CaughtError {
        self.properties.push((key.into(), value.into()));
        self
    }
}

impl std::fmt::Display for CaughtError {
    /// `"Name: message"`, or the bare name when the message is empty.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

/// A single field of a structured [`LogInput::Object`].
///
/// Almost always plain JSON; the two extra arms cover values JSON cannot carry (an explicit
/// "undefined" & a caught error) which the normalizer coerces per its own table.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Json(Value),
    Undefined,
    Caught(CaughtError),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Json(value)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Json(Value::String(s.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Json(Value::String(s))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Json(Value::from(n))
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Json(Value::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Json(Value::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Json(Value::Bool(b))
    }
}

impl From<CaughtError> for FieldValue {
    fn from(err: CaughtError) -> Self {
        FieldValue::Caught(err)
    }
}

/// The caller-supplied value, classified once at entry to normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum LogInput {
    /// An explicit null. Dropped by the normalizer.
    Null,
    /// An explicitly absent value. Normalizes to `{"message": "undefined"}` -- the asymmetry
    /// with [`LogInput::Null`] is deliberate & preserved.
    Undefined,
    /// A string, number or boolean.
    Scalar(Value),
    Array(Vec<Value>),
    /// A structured record; insertion order is preserved all the way to the wire.
    Object(Vec<(String, FieldValue)>),
    Caught(CaughtError),
}

impl LogInput {
    /// Build a structured record from `(name, value)` pairs.
    pub fn object<K, V, I>(fields: I) -> LogInput
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        LogInput::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for LogInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => LogInput::Null,
            Value::Array(items) => LogInput::Array(items),
            Value::Object(map) => LogInput::Object(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::Json(v)))
                    .collect(),
            ),
            scalar => LogInput::Scalar(scalar),
        }
    }
}

impl From<&str> for LogInput {
    fn from(s: &str) -> Self {
        LogInput::Scalar(Value::String(s.to_string()))
    }
}

impl From<String> for LogInput {
    fn from(s: String) -> Self {
        LogInput::Scalar(Value::String(s))
    }
}

impl From<i64> for LogInput {
    fn from(n: i64) -> Self {
        LogInput::Scalar(Value::from(n))
    }
}

impl From<u64> for LogInput {
    fn from(n: u64) -> Self {
        LogInput::Scalar(Value::from(n))
    }
}

impl From<f64> for LogInput {
    fn from(n: f64) -> Self {
        LogInput::Scalar(Value::from(n))
    }
}

impl From<bool> for LogInput {
    fn from(b: bool) -> Self {
        LogInput::Scalar(Value::Bool(b))
    }
}

impl From<CaughtError> for LogInput {
    fn from(err: CaughtError) -> Self {
        LogInput::Caught(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn classification() {
        assert_eq!(LogInput::from(json!(null)), LogInput::Null);
        assert_eq!(
            LogInput::from("hi"),
            LogInput::Scalar(Value::String("hi".to_string()))
        );
        assert_eq!(LogInput::from(json!([1, 2])), LogInput::Array(vec![json!(1), json!(2)]));
        match LogInput::from(json!({"a": 1, "b": "two"})) {
            LogInput::Object(fields) => {
                assert_eq!(fields[0], ("a".to_string(), FieldValue::Json(json!(1))));
                assert_eq!(fields[1], ("b".to_string(), FieldValue::Json(json!("two"))));
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn caught_error_display() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "test error");
        let caught = CaughtError::new(&io);
        assert_eq!(caught.message, "test error");
        assert!(!caught.stack.is_empty());
        assert_eq!(format!("{}", caught), "Error: test error");
        assert_eq!(
            format!("{}", CaughtError::from_message("").with_name("RangeError")),
            "RangeError"
        );
    }
}
