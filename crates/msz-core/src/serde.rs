//! JSON object helpers shared by result flattening.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, MszError};

fn serde_error(code: &str, err: impl ToString) -> MszError {
    MszError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Flattens a serializable record into a JSON object map.
pub fn to_flat_map<T: Serialize>(value: &T) -> Result<Map<String, Value>, MszError> {
    match serde_json::to_value(value).map_err(|err| serde_error("map_serialize", err))? {
        Value::Object(map) => Ok(map),
        other => Err(MszError::Serde(
            ErrorInfo::new("map_serialize", "record did not serialize to an object")
                .with_context("kind", json_kind(&other)),
        )),
    }
}

/// Rebuilds a record from a JSON object map.
pub fn from_flat_map<T: DeserializeOwned>(map: Map<String, Value>) -> Result<T, MszError> {
    serde_json::from_value(Value::Object(map)).map_err(|err| serde_error("map_deserialize", err))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
