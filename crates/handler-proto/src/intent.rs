use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{HandlerError, Result};

pub type Parameters = Map<String, Value>;

/// A request produced by the upstream language model.
///
/// `aircraft` is accepted as an alias of `vehicle`; that is what the
/// upstream prompt calls the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(alias = "aircraft")]
    pub vehicle: String,
    pub action: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Intent {
    pub fn new(vehicle: impl Into<String>, action: impl Into<String>) -> Self {
        Self { vehicle: vehicle.into(), action: action.into(), parameters: Parameters::new() }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }
}

/// Intent input as it reaches the dispatcher: text off the wire, an
/// already-parsed JSON value, or a typed intent.
#[derive(Debug, Clone)]
pub enum RawIntent {
    Text(String),
    Json(Value),
    Parsed(Intent),
}

impl From<&str> for RawIntent {
    fn from(s: &str) -> Self { RawIntent::Text(s.to_string()) }
}

impl From<String> for RawIntent {
    fn from(s: String) -> Self { RawIntent::Text(s) }
}

impl From<Value> for RawIntent {
    fn from(v: Value) -> Self { RawIntent::Json(v) }
}

impl From<Intent> for RawIntent {
    fn from(i: Intent) -> Self { RawIntent::Parsed(i) }
}

/// Turn raw input into exactly one validated intent.
///
/// Normalization: the upstream model sometimes wraps its answer in a JSON
/// array. A non-empty array is reduced to its first element (with a
/// warning); an empty array is a format error.
pub fn decode(raw: impl Into<RawIntent>) -> Result<Intent> {
    let value = match raw.into() {
        RawIntent::Parsed(intent) => return validate(intent),
        RawIntent::Text(text) => {
            serde_json::from_str::<Value>(&text).map_err(|e| HandlerError::Decode(e.to_string()))?
        }
        RawIntent::Json(value) => value,
    };
    let record = single_record(value)?;
    from_record(record)
}

fn single_record(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => {
            let count = items.len();
            let first = items
                .into_iter()
                .next()
                .ok_or_else(|| HandlerError::Format("empty intent sequence".into()))?;
            warn!("intent arrived as a sequence of {}; using the first element", count);
            match first {
                Value::Object(map) => Ok(map),
                other => Err(HandlerError::Format(format!("sequence element is {}", kind(&other)))),
            }
        }
        other => Err(HandlerError::Format(format!("expected an object, got {}", kind(&other)))),
    }
}

fn from_record(mut record: Map<String, Value>) -> Result<Intent> {
    let vehicle = required_name(&record, &["vehicle", "aircraft"])
        .ok_or_else(|| HandlerError::Validation("missing vehicle".into()))?;
    let action = required_name(&record, &["action"])
        .ok_or_else(|| HandlerError::Validation("missing action".into()))?;

    let parameters = match record.remove("parameters") {
        None | Some(Value::Null) => Parameters::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(HandlerError::Validation(format!("parameters must be an object, got {}", kind(&other))))
        }
    };

    Ok(Intent { vehicle, action, parameters })
}

fn required_name(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate(intent: Intent) -> Result<Intent> {
    if intent.vehicle.trim().is_empty() {
        return Err(HandlerError::Validation("missing vehicle".into()));
    }
    if intent.action.trim().is_empty() {
        return Err(HandlerError::Validation("missing action".into()));
    }
    Ok(intent)
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_text_record() {
        let intent = decode(r#"{"vehicle":"OH-58D","action":"set_master_arm","parameters":{"state":0}}"#).unwrap();
        assert_eq!(intent.vehicle, "OH-58D");
        assert_eq!(intent.action, "set_master_arm");
        assert_eq!(intent.parameters.get("state"), Some(&json!(0)));
    }

    #[test]
    fn aircraft_is_an_alias_for_vehicle() {
        let intent = decode(json!({"aircraft": "OH-58D", "action": "laser_arm"})).unwrap();
        assert_eq!(intent.vehicle, "OH-58D");
        assert!(intent.parameters.is_empty());
    }

    #[test]
    fn malformed_text_is_a_decode_error() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));
    }

    #[test]
    fn sequence_uses_first_element() {
        let intent = decode(json!([
            {"vehicle": "OH-58D", "action": "weapon_gun"},
            {"vehicle": "OH-58D", "action": "weapon_rockets"}
        ]))
        .unwrap();
        assert_eq!(intent.action, "weapon_gun");
    }

    #[test]
    fn empty_sequence_is_a_format_error() {
        assert!(matches!(decode("[]").unwrap_err(), HandlerError::Format(_)));
    }

    #[test]
    fn scalars_are_format_errors() {
        assert!(matches!(decode("42").unwrap_err(), HandlerError::Format(_)));
        assert!(matches!(decode(json!(["laser_arm"])).unwrap_err(), HandlerError::Format(_)));
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        assert!(matches!(decode(json!({"action": "laser_arm"})).unwrap_err(), HandlerError::Validation(_)));
        assert!(matches!(decode(json!({"vehicle": "OH-58D", "action": ""})).unwrap_err(), HandlerError::Validation(_)));
        assert!(matches!(
            decode(json!({"vehicle": "OH-58D", "action": "laser_arm", "parameters": [1]})).unwrap_err(),
            HandlerError::Validation(_)
        ));
        assert!(matches!(decode(Intent::new("", "laser_arm")).unwrap_err(), HandlerError::Validation(_)));
    }

    #[test]
    fn null_parameters_default_to_empty() {
        let intent = decode(json!({"vehicle": "OH-58D", "action": "laser_arm", "parameters": null})).unwrap();
        assert!(intent.parameters.is_empty());
    }
}
