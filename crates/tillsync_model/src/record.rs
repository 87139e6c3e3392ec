//! The JSON row envelope.

use crate::error::{ModelError, ModelResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A row as stored locally and exchanged with the remote service.
///
/// The primary key is the string column `id`.
pub type Record = Map<String, Value>;

/// Returns the `id` column of a record, if it is a non-empty string.
pub fn record_id(record: &Record) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Serializes a typed value into a record.
pub fn to_record<T: Serialize>(value: &T) -> ModelResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(ModelError::NotAnObject),
    }
}

/// Deserializes a record into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> ModelResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}
