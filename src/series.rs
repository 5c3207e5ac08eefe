//! ==============================================================================
//! series.rs - readings and the series normalizer
//! ==============================================================================
//!
//! purpose:
//!     turns the json payload of a time-series endpoint into a typed series.
//!     the upstream service already did all bucketing and averaging, so this
//!     module only validates and parses. it never sorts, resamples or fills
//!     gaps.
//!
//! relationships:
//!     - used by: fetcher.rs (fetch_series), render.rs (charts and tables)
//!     - produces: error.rs (SchemaError)
//!
//! ==============================================================================

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::SchemaError;

/// formats tried in order when the time field is not rfc 3339.
/// the first is what the upstream service emits.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// a point in time exactly as the upstream service wrote it
///
/// `local` is the wall-clock time from the string. `offset` is only set
/// when the string carried one; it is never invented or normalized away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl Timestamp {
    pub fn naive(local: NaiveDateTime) -> Self {
        Self { local, offset: None }
    }

    /// milliseconds on a common axis; offset-less times count as utc
    pub fn millis(&self) -> i64 {
        let shift = self.offset.map_or(0, |o| i64::from(o.local_minus_utc()) * 1000);
        self.local.and_utc().timestamp_millis() - shift
    }

    /// `local` in `fmt`, followed by the offset when there is one
    pub fn format_with(&self, fmt: &str) -> String {
        match self.offset {
            Some(offset) => format!("{}{}", self.local.format(fmt), offset),
            None => self.local.format(fmt).to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(DISPLAY_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format_with(ISO_FORMAT))
    }
}

/// a single temperature sample
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reading {
    #[serde(rename = "time")]
    pub timestamp: Timestamp,
    pub value: f64,
}

/// readings in the order the upstream service returned them
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}

/// convert a json array of {time, value} records into a series
///
/// one bad record fails the whole series; the caller skips that view.
pub fn normalize(payload: &Value) -> Result<Series, SchemaError> {
    let records = payload.as_array().ok_or(SchemaError::NotAnArray {
        found: json_type_name(payload),
    })?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect::<Result<Vec<_>, _>>()
        .map(Series::new)
}

fn parse_record(index: usize, record: &Value) -> Result<Reading, SchemaError> {
    let fields = record.as_object().ok_or(SchemaError::NotARecord { index })?;

    let time = fields
        .get("time")
        .ok_or(SchemaError::MissingField { index, field: "time" })?
        .as_str()
        .ok_or(SchemaError::WrongType {
            index,
            field: "time",
            expected: "a string",
        })?;

    let value = fields
        .get("value")
        .ok_or(SchemaError::MissingField { index, field: "value" })?
        .as_f64()
        .ok_or(SchemaError::WrongType {
            index,
            field: "value",
            expected: "a number",
        })?;

    let timestamp = parse_timestamp(time).ok_or_else(|| SchemaError::BadTimestamp {
        index,
        value: time.to_string(),
    })?;

    Ok(Reading { timestamp, value })
}

/// parse a time string emitted by the upstream service
///
/// an rfc 3339 offset is kept as written; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Timestamp {
            local: dt.naive_local(),
            offset: Some(*dt.offset()),
        });
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(Timestamp::naive)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
