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

//! The GELF log normalization pipeline.
//!
//! [`normalize`] deterministically coerces a [`LogInput`] plus an optional requested level into
//! a single valid JSON document carrying the required GELF fields (`message`, `version`,
//! `timestamp`, `node`, `host`, `level`). The step order is load-bearing: `message`, when not
//! supplied by the caller, is a snapshot of the payload *before* any metadata is merged in, so
//! re-ordering the steps changes what goes over the wire.
//!
//! A handful of semantics here are deliberately faithful to the JavaScript GELF clients whose
//! documents the receiving servers already expect, rather than to Rust sensibilities:
//!
//! - a key counts as "missing" when its value is JS-falsy (absent, undefined, `null`, `false`,
//!   `""`, `0`), which is what the `||=` merges below implement;
//! - snapshot serialization follows `JSON.stringify`: undefined members are omitted & caught
//!   errors render as `{}`;
//! - `normalize` of an explicit null is a drop, while "undefined" yields a document whose
//!   `message` is the string `"undefined"`. The asymmetry is by design.
//!
//! Inputs that cannot be serialized at all are dropped outright -- never partially sent, and
//! never surfaced to the caller as an error.

use crate::{
    input::{CaughtError, FieldValue, LogInput},
    level::{self, LevelSpec},
};

use chrono::Utc;
use serde_json::{Map, Value};

/// The GELF spec version stamped on every document.
pub const GELF_VERSION: &str = "1.1";

/// Metadata fields exempt from the per-field coercion pass.
pub const RESERVED_FIELDS: [&str; 7] = [
    "message",
    "version",
    "timestamp",
    "node",
    "host",
    "level",
    "levelName",
];

/// A finished, JSON-serializable GELF document. Field order is preserved from insertion.
pub type Document = Map<String, Value>;

/// Immutable per-client configuration captured at construction & passed explicitly into
/// normalization. No ambient state.
#[derive(Clone, Debug)]
pub struct Defaults {
    /// Client node name; GELF's non-standard origin tag.
    pub node: String,
    /// Client hostname; omitted from documents when unset.
    pub host: Option<String>,
    /// Severity applied when a call requests none.
    pub default_level: LevelSpec,
}

impl std::default::Default for Defaults {
    fn default() -> Self {
        Defaults {
            node: "node".to_string(),
            host: None,
            default_level: LevelSpec::from(level::INFO),
        }
    }
}

// The working document: an insertion-ordered list of fields. serde_json's Map (even with
// preserve_order) re-orders on remove, so field surgery happens here and the Map is only built
// once, at the end.
type Fields = Vec<(String, FieldValue)>;

fn get<'a>(doc: &'a Fields, key: &str) -> Option<&'a FieldValue> {
    doc.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// Replace in place when the key exists (preserving its position), append otherwise.
fn set(doc: &mut Fields, key: &str, value: FieldValue) {
    match doc.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value,
        None => doc.push((key.to_string(), value)),
    }
}

fn remove(doc: &mut Fields, key: &str) -> Option<FieldValue> {
    let i = doc.iter().position(|(k, _)| k == key)?;
    Some(doc.remove(i).1)
}

/// JS falsiness, as applied by the `||=` merges.
fn is_falsy(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Undefined) => true,
        Some(FieldValue::Caught(_)) => false,
        Some(FieldValue::Json(v)) => match v {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::String(s) => s.is_empty(),
            Value::Number(n) => n.as_f64() == Some(0.0),
            _ => false,
        },
    }
}

/// Serialize the working document with `JSON.stringify` semantics: undefined members omitted,
/// caught errors rendered as `{}` (their enumerable property set is empty).
fn snapshot_json(doc: &Fields) -> serde_json::Result<String> {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        match value {
            FieldValue::Undefined => continue,
            FieldValue::Caught(_) => {
                map.insert(key.clone(), Value::Object(Map::new()));
            }
            FieldValue::Json(v) => {
                map.insert(key.clone(), v.clone());
            }
        }
    }
    serde_json::to_string(&map)
}

/// `String(v)` for the scalar wrap: strings unquoted, numbers & booleans via their canonical
/// text form.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interpret a document's raw `level` field as a level request, if it can be one.
///
/// Numbers become codes, strings become names, objects contribute whatever `code`/`name` they
/// carry. Anything else level-shaped enough to be present but resolvable to neither (arrays,
/// caught errors, non-integral numbers) yields an empty custom pair, so the document goes out
/// with both `level` & `levelName` absent.
fn field_level_spec(value: FieldValue) -> Option<LevelSpec> {
    match value {
        FieldValue::Json(Value::Number(n)) => Some(match n.as_i64() {
            Some(code) => LevelSpec::Code(code),
            None => LevelSpec::Custom {
                code: None,
                name: None,
            },
        }),
        FieldValue::Json(Value::String(s)) => Some(LevelSpec::Name(s)),
        FieldValue::Json(Value::Object(map)) => Some(LevelSpec::Custom {
            code: map.get("code").and_then(Value::as_i64),
            name: map
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        FieldValue::Json(Value::Bool(b)) => Some(LevelSpec::Name(b.to_string())),
        FieldValue::Json(Value::Null) | FieldValue::Undefined => None,
        FieldValue::Json(Value::Array(_)) | FieldValue::Caught(_) => Some(LevelSpec::Custom {
            code: None,
            name: None,
        }),
    }
}

/// The expansion of a caught error into a plain field value: `message`, `stack`, then any extra
/// properties the catcher attached.
fn error_object(err: &CaughtError) -> Value {
    let mut map = Map::with_capacity(2 + err.properties.len());
    map.insert("message".to_string(), Value::String(err.message.clone()));
    map.insert("stack".to_string(), Value::String(err.stack.clone()));
    for (key, value) in &err.properties {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

// The `message` snapshot of a document that was nothing but a caught error.
const DEGENERATE_ERROR_SNAPSHOT: &str = r#"{"error":{}}"#;

/// Normalize `input` into a finished GELF document, or `None` when the input must be dropped
/// (explicit null, or unserializable).
pub fn normalize(
    input: LogInput,
    requested: Option<LevelSpec>,
    defaults: &Defaults,
) -> Option<Document> {
    // Steps 1-5: classify & wrap. Scalars become {message: String(v)}; an explicit null is
    // dropped; a caught error becomes {error: e}; an array collapses to its JSON text,
    // discarding everything else.
    let mut doc: Fields = match input {
        LogInput::Null => return None,
        LogInput::Undefined => vec![(
            "message".to_string(),
            FieldValue::Json(Value::String("undefined".to_string())),
        )],
        LogInput::Scalar(v) => vec![(
            "message".to_string(),
            FieldValue::Json(Value::String(scalar_to_string(&v))),
        )],
        LogInput::Caught(err) => vec![("error".to_string(), FieldValue::Caught(err))],
        LogInput::Array(items) => {
            let text = serde_json::to_string(&Value::Array(items)).ok()?;
            vec![("message".to_string(), FieldValue::Json(Value::String(text)))]
        }
        LogInput::Object(fields) => fields,
    };

    // Step 3: trial serialization. A document JSON cannot carry is dropped whole, never
    // partially sent.
    snapshot_json(&doc).ok()?;

    // Step 6: when the caller supplied no message, snapshot the payload as it stands --
    // before the metadata merges below.
    if is_falsy(get(&doc, "message")) {
        let text = snapshot_json(&doc).ok()?;
        set(&mut doc, "message", FieldValue::Json(Value::String(text)));
    }

    // Step 7: merge defaults.
    if is_falsy(get(&doc, "version")) {
        set(
            &mut doc,
            "version",
            FieldValue::Json(Value::String(GELF_VERSION.to_string())),
        );
    }
    if is_falsy(get(&doc, "timestamp")) {
        let now = Utc::now().timestamp_millis() as f64 / 1e3;
        if let Some(ts) = serde_json::Number::from_f64(now) {
            set(&mut doc, "timestamp", FieldValue::Json(Value::Number(ts)));
        }
    }
    if is_falsy(get(&doc, "node")) {
        set(
            &mut doc,
            "node",
            FieldValue::Json(Value::String(defaults.node.clone())),
        );
    }
    if is_falsy(get(&doc, "host")) {
        match &defaults.host {
            Some(host) => set(
                &mut doc,
                "host",
                FieldValue::Json(Value::String(host.clone())),
            ),
            // No configured host: a falsy host field present in the input is suppressed
            // from the wire.
            None => {
                if get(&doc, "host").is_some() {
                    set(&mut doc, "host", FieldValue::Undefined);
                }
            }
        }
    }

    // Steps 8 & 9: a level requested for this call wins over a `level` field in the input;
    // either is resolved against the configured default. The raw key is deleted & the
    // resolved code re-appended, so `level` always lands at the end of the document.
    let field_spec = remove(&mut doc, "level");
    let spec = match requested {
        Some(spec) => Some(spec),
        None => field_spec.and_then(field_level_spec),
    };
    let resolved = level::resolve(spec.as_ref(), &defaults.default_level);
    if let Some(code) = resolved.code {
        doc.push(("level".to_string(), FieldValue::Json(Value::from(code))));
    }
    if let Some(name) = resolved.name {
        doc.push(("levelName".to_string(), FieldValue::Json(Value::String(name))));
    }

    // Step 10: coerce every passthrough field by type. The loop walks by index because the
    // error arm appends `messageError` & `stack` mid-flight.
    let mut i = 0;
    while i < doc.len() {
        if RESERVED_FIELDS.contains(&doc[i].0.as_str()) {
            i += 1;
            continue;
        }
        let value = std::mem::replace(&mut doc[i].1, FieldValue::Undefined);
        let coerced = match value {
            FieldValue::Json(v @ Value::Number(_)) | FieldValue::Json(v @ Value::String(_)) => v,
            FieldValue::Json(Value::Null) => Value::String("null".to_string()),
            FieldValue::Undefined => Value::String("undefined".to_string()),
            FieldValue::Caught(err) => {
                set(
                    &mut doc,
                    "messageError",
                    FieldValue::Json(Value::String(err.message.clone())),
                );
                set(
                    &mut doc,
                    "stack",
                    FieldValue::Json(Value::String(err.stack.clone())),
                );
                // A snapshot of a bare caught error is useless ({"error":{}}); the error's
                // display form carries strictly more information.
                if get(&doc, "message")
                    == Some(&FieldValue::Json(Value::String(
                        DEGENERATE_ERROR_SNAPSHOT.to_string(),
                    )))
                {
                    set(
                        &mut doc,
                        "message",
                        FieldValue::Json(Value::String(err.to_string())),
                    );
                }
                error_object(&err)
            }
            FieldValue::Json(v @ Value::Array(_)) | FieldValue::Json(v @ Value::Object(_)) => {
                Value::String(serde_json::to_string_pretty(&v).ok()?)
            }
            FieldValue::Json(Value::Bool(b)) => Value::String(b.to_string()),
        };
        doc[i].1 = FieldValue::Json(coerced);
        i += 1;
    }

    // Build the final map. Undefined members vanish; a caught error that hid under a reserved
    // name serializes as `{}`, as it would have in the snapshot.
    let mut out = Document::with_capacity(doc.len());
    for (key, value) in doc {
        match value {
            FieldValue::Undefined => continue,
            FieldValue::Caught(_) => {
                out.insert(key, Value::Object(Map::new()));
            }
            FieldValue::Json(v) => {
                out.insert(key, v);
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn defaults() -> Defaults {
        Defaults {
            node: "dev.log.test".to_string(),
            host: Some("my-web-project.com".to_string()),
            default_level: LevelSpec::from(level::INFO),
        }
    }

    fn caught() -> CaughtError {
        CaughtError::from_message("test error")
    }

    #[test]
    fn scalar_inputs_become_message() {
        for (input, expected) in [
            (LogInput::from("String line log"), "String line log"),
            (LogInput::from(42i64), "42"),
            (LogInput::from(1.5f64), "1.5"),
            (LogInput::from(true), "true"),
        ] {
            let doc = normalize(input, None, &defaults()).unwrap();
            assert_eq!(doc["message"], json!(expected));
        }
    }

    #[test]
    fn null_drops_undefined_does_not() {
        assert!(normalize(LogInput::Null, None, &defaults()).is_none());
        let doc = normalize(LogInput::Undefined, None, &defaults()).unwrap();
        assert_eq!(doc["message"], json!("undefined"));
    }

    #[test]
    fn message_snapshot_precedes_metadata() {
        let doc = normalize(
            LogInput::object([("code", FieldValue::from(1245i64)), ("label", "label".into())]),
            None,
            &defaults(),
        )
        .unwrap();
        // The snapshot must not contain version/timestamp/node/host, and must preserve the
        // caller's field order.
        assert_eq!(doc["message"], json!(r#"{"code":1245,"label":"label"}"#));
    }

    #[test]
    fn defaults_are_merged() {
        let doc = normalize(LogInput::from("x"), None, &defaults()).unwrap();
        assert_eq!(doc["version"], json!("1.1"));
        assert_eq!(doc["node"], json!("dev.log.test"));
        assert_eq!(doc["host"], json!("my-web-project.com"));
        assert!(doc["timestamp"].as_f64().unwrap() > 1.5e9);
    }

    #[test]
    fn caller_metadata_wins_over_defaults() {
        let doc = normalize(
            LogInput::object([
                ("message", FieldValue::from("m")),
                ("version", "1.0".into()),
                ("timestamp", FieldValue::from(123.25f64)),
                ("node", "other".into()),
            ]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["version"], json!("1.0"));
        assert_eq!(doc["timestamp"], json!(123.25));
        assert_eq!(doc["node"], json!("other"));
    }

    #[test]
    fn host_is_omitted_when_unconfigured() {
        let mut d = defaults();
        d.host = None;
        let doc = normalize(LogInput::from("x"), None, &d).unwrap();
        assert!(!doc.contains_key("host"));
    }

    #[test]
    fn default_level_applied() {
        let doc = normalize(
            LogInput::object([("code", FieldValue::from(1245i64)), ("label", "label".into())]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["level"], json!(6));
        assert_eq!(doc["levelName"], json!("info"));
        assert_eq!(doc["code"], json!(1245));
        assert_eq!(doc["label"], json!("label"));
    }

    #[test]
    fn requested_level_overrides_field_level() {
        let doc = normalize(
            LogInput::object([("message", FieldValue::from("m")), ("level", 7i64.into())]),
            Some(LevelSpec::from(level::ALERT)),
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["level"], json!(1));
        assert_eq!(doc["levelName"], json!("alert"));
    }

    #[test]
    fn field_level_variants() {
        // numeric code
        let doc = normalize(
            LogInput::object([("message", FieldValue::from("m")), ("level", 3i64.into())]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["level"], json!(3));
        assert_eq!(doc["levelName"], json!("error"));

        // name, any case
        let doc = normalize(
            LogInput::object([("message", FieldValue::from("m")), ("level", "ERROR".into())]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["level"], json!(3));
        assert_eq!(doc["levelName"], json!("error"));

        // custom pair, verbatim
        let doc = normalize(
            LogInput::object([
                ("message", FieldValue::from("m")),
                ("level", json!({"code": 1, "name": "alert"}).into()),
            ]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["level"], json!(1));
        assert_eq!(doc["levelName"], json!("alert"));

        // unknown code: shipped without a name
        let doc = normalize(
            LogInput::object([("message", FieldValue::from("m")), ("level", 999i64.into())]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["level"], json!(999));
        assert!(!doc.contains_key("levelName"));
    }

    #[test]
    fn resolved_level_lands_at_document_end() {
        let doc = normalize(
            LogInput::object([("level", FieldValue::from(3i64)), ("label", "label".into())]),
            None,
            &defaults(),
        )
        .unwrap();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        let level_at = keys.iter().position(|k| *k == "level").unwrap();
        let name_at = keys.iter().position(|k| *k == "levelName").unwrap();
        assert_eq!(name_at, level_at + 1);
        assert!(keys.iter().position(|k| *k == "label").unwrap() < level_at);
        // The pre-metadata snapshot includes the raw level field.
        assert_eq!(doc["message"], json!(r#"{"level":3,"label":"label"}"#));
    }

    #[test]
    fn caught_error_input() {
        let doc = normalize(LogInput::Caught(caught()), None, &defaults()).unwrap();
        assert_eq!(doc["messageError"], json!("test error"));
        assert!(!doc["stack"].as_str().unwrap().is_empty());
        assert_eq!(doc["error"]["message"], json!("test error"));
        assert!(!doc["error"]["stack"].as_str().unwrap().is_empty());
        // The degenerate {"error":{}} snapshot is replaced by the error's display form.
        assert_eq!(doc["message"], json!("Error: test error"));
    }

    #[test]
    fn caught_error_in_field_keeps_caller_message() {
        let doc = normalize(
            LogInput::object([
                ("message", FieldValue::from("exec test error")),
                ("error", caught().into()),
            ]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["message"], json!("exec test error"));
        assert_eq!(doc["messageError"], json!("test error"));
        assert_eq!(doc["error"]["message"], json!("test error"));
    }

    #[test]
    fn array_input_collapses_to_message() {
        let doc = normalize(LogInput::from(json!([1, "two", null])), None, &defaults()).unwrap();
        assert_eq!(doc["message"], json!(r#"[1,"two",null]"#));
    }

    #[test]
    fn field_coercion_table() {
        let doc = normalize(
            LogInput::object([
                ("message", FieldValue::from("m")),
                ("n", 7i64.into()),
                ("s", "text".into()),
                ("nothing", FieldValue::Json(Value::Null)),
                ("missing", FieldValue::Undefined),
                ("flag", true.into()),
                ("items", json!([1, 2]).into()),
                ("nested", json!({"a": 1}).into()),
            ]),
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(doc["n"], json!(7));
        assert_eq!(doc["s"], json!("text"));
        assert_eq!(doc["nothing"], json!("null"));
        assert_eq!(doc["missing"], json!("undefined"));
        assert_eq!(doc["flag"], json!("true"));
        assert_eq!(doc["items"], json!("[\n  1,\n  2\n]"));
        assert_eq!(doc["nested"], json!("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn whole_document_is_json_serializable() {
        let doc = normalize(
            LogInput::object([("error", FieldValue::from(caught())), ("n", 1i64.into())]),
            Some(LevelSpec::from(level::ERROR)),
            &defaults(),
        )
        .unwrap();
        let bytes = serde_json::to_vec(&doc).unwrap();
        let round: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(round["level"], json!(3));
    }
}
