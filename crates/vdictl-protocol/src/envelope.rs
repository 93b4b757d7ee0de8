//! Response envelope and the timestamp-normalizing JSON decode hook.
//!
//! Every toolstack response is wrapped as
//!
//! ```json
//! {
//!   "Status": {"Timestamp": ..., "ServerVersion": "1.2.3", "ExecutionStatus": 0, "ErrorMessage": ""},
//!   "Data": [...]
//! }
//! ```
//!
//! Decoding goes through [`NormalizedValue`], which rewrites legacy
//! `/Date(<ms>)/` strings found in members ending in `Time` while the JSON is
//! being parsed, so neither backend needs a second pass over the tree.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::trace;
use vdictl_core::{format_timestamp, is_timestamp_field, parse_legacy_timestamp};

use crate::error::{ProtocolError, ProtocolResult};

/// The `Status` block of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    /// When the response was produced, as sent by the server.
    #[serde(default)]
    pub timestamp: Option<Value>,
    /// Version of the server-side wrapper.
    #[serde(default, alias = "PSyTricksVersion")]
    pub server_version: Option<String>,
    /// Zero on success. Some toolstack versions send it as a numeric string.
    #[serde(deserialize_with = "status_code")]
    pub execution_status: i64,
    /// Populated when `execution_status` is nonzero.
    #[serde(default, deserialize_with = "status_message")]
    pub error_message: Option<String>,
}

fn status_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let code = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    code.ok_or_else(|| de::Error::custom(format!("invalid execution status {}", value)))
}

fn status_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl Status {
    /// Returns true if the toolstack reported success.
    pub fn is_success(&self) -> bool {
        self.execution_status == 0
    }

    /// Returns the error message, or an empty string.
    pub fn error_message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }
}

/// A decoded `{Status, Data}` response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Execution status reported by the toolstack.
    pub status: Status,
    /// The payload; a list, an object or null depending on the command.
    pub data: Value,
}

impl ResponseEnvelope {
    /// Splits an already-normalized JSON value into status and data.
    ///
    /// # Errors
    ///
    /// Fails if the value is not an object, if `Status` or `Data` is missing,
    /// or if `Status` does not have the expected shape.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        let mut object = into_object(value)?;
        let status = take_status(&mut object)?;
        let data = object
            .remove("Data")
            .ok_or_else(|| ProtocolError::MalformedEnvelope("missing 'Data'".to_string()))?;
        Ok(Self { status, data })
    }

    /// Returns the payload.
    pub fn into_data(self) -> Value {
        self.data
    }
}

fn into_object(value: Value) -> ProtocolResult<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(ProtocolError::MalformedEnvelope(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn take_status(object: &mut Map<String, Value>) -> ProtocolResult<Status> {
    let status = object
        .remove("Status")
        .ok_or_else(|| ProtocolError::MalformedEnvelope("missing 'Status'".to_string()))?;
    serde_json::from_value(status)
        .map_err(|e| ProtocolError::MalformedEnvelope(format!("invalid 'Status': {}", e)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes a complete envelope from JSON text.
pub fn decode_envelope(text: &str) -> ProtocolResult<ResponseEnvelope> {
    ResponseEnvelope::from_value(from_str_normalized(text)?)
}

/// Decodes only the `Status` block; used for error responses which may lack `Data`.
pub fn decode_status(bytes: &[u8]) -> ProtocolResult<Status> {
    let mut object = into_object(from_slice_normalized(bytes)?)?;
    take_status(&mut object)
}

/// Parses JSON text, normalizing legacy timestamps on the way.
pub fn from_str_normalized(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str::<NormalizedValue>(text).map(|v| v.0)
}

/// Parses JSON bytes, normalizing legacy timestamps on the way.
pub fn from_slice_normalized(bytes: &[u8]) -> serde_json::Result<Value> {
    serde_json::from_slice::<NormalizedValue>(bytes).map(|v| v.0)
}

/// A JSON value whose timestamp members were normalized during deserialization.
///
/// Members whose name ends in `Time` and whose value is a `/Date(<ms>)/`
/// string are replaced by the RFC 3339 rendering of the instant (first ten
/// digits taken as epoch seconds). Everything else passes through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedValue(pub Value);

impl<'de> Deserialize<'de> for NormalizedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NormalizingVisitor).map(NormalizedValue)
    }
}

struct NormalizingVisitor;

impl<'de> Visitor<'de> for NormalizingVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any valid JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        NormalizedValue::deserialize(deserializer).map(|v| v.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(NormalizedValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            let NormalizedValue(value) = access.next_value()?;
            let value = normalize_member(&key, value);
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

fn normalize_member(key: &str, value: Value) -> Value {
    let converted = match &value {
        Value::String(s) if is_timestamp_field(key) => parse_legacy_timestamp(s),
        _ => None,
    };

    match converted {
        Some(ts) => {
            trace!(field = %key, raw = ?value, converted = %ts, "normalized legacy timestamp");
            Value::String(format_timestamp(&ts))
        }
        None => value,
    }
}
