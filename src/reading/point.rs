//! Wire form of a reading and InfluxDB line-protocol encoding.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag set: indexed, low-cardinality string dimensions.
pub type TagSet = BTreeMap<String, String>;

/// Field set: the payload of a point.
pub type FieldSet = BTreeMap<String, FieldValue>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// A time-series point as handed to the sink transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Measurement name (e.g. "sensors").
    pub measurement: String,
    /// Identifying dimensions.
    pub tags: TagSet,
    /// Payload; never empty for points built from readings.
    pub fields: FieldSet,
    /// Point timestamp (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Render the point as one line of InfluxDB line protocol.
    ///
    /// Timestamps use nanosecond precision. Non-finite floats are skipped
    /// because the store cannot represent them.
    pub fn to_line_protocol(&self) -> String {
        let mut line = String::with_capacity(128);
        line.push_str(&escape_measurement(&self.measurement));

        for (key, value) in &self.tags {
            if value.is_empty() {
                // Empty tag values are rejected by the write API.
                continue;
            }
            let _ = write!(line, ",{}={}", escape_key(key), escape_key(value));
        }

        let mut first = true;
        for (key, value) in &self.fields {
            let Some(encoded) = encode_field(value) else {
                continue;
            };
            line.push(if first { ' ' } else { ',' });
            first = false;
            let _ = write!(line, "{}={}", escape_key(key), encoded);
        }

        if let Some(ns) = self.timestamp.timestamp_nanos_opt() {
            let _ = write!(line, " {ns}");
        }
        line
    }
}

fn encode_field(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Float(v) if !v.is_finite() => None,
        FieldValue::Float(v) => Some(format!("{v}")),
        FieldValue::Integer(v) => Some(format!("{v}i")),
        FieldValue::Boolean(v) => Some(if *v { "true" } else { "false" }.to_string()),
        FieldValue::Text(s) => Some(format!(
            "\"{}\"",
            s.replace('\\', "\\\\").replace('"', "\\\"")
        )),
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
