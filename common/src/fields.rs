// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Serde helpers shared by the record types.
//!
//! Stored documents are written by hand-edited exports as often as by this
//! crate, so the readers here are lenient: `null` falls back to the field's
//! default, scalars are accepted where text is expected, and empty strings
//! count as "no date".

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::de::{self, Deserialize, Deserializer};
use serde::Serializer;
use serde_json::Value;
use uuid::Uuid;

/// Current instant, truncated to the millisecond precision timestamps are
/// persisted with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Renders a timestamp as `2024-10-01T12:30:00.000Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generates a record id such as `cli_3f2b...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// `(de)serialize_with` pair for `DateTime<Utc>` timestamps.
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    /// Missing or empty timestamps are stamped with the current time.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", text, e))),
            _ => Ok(now()),
        }
    }
}

/// Reads a text field, mapping `null` to `""` and numbers/booleans to their
/// textual form.
pub fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!("expected text, found {}", other))),
    }
}

/// Reads any `Default` value, mapping `null` to the default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads an amount. Accepts JSON numbers and numeric strings; `null` is zero.
pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("amount is out of range")),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("amount '{}' is not a number", s))),
        other => Err(de::Error::custom(format!("amount must be a number, found {}", other))),
    }
}

/// Reads a count of days. Accepts integers, integral floats and numeric
/// strings; `null` and `""` are `None` so the caller can apply its default.
pub fn whole_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    number
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("days must be a whole number, found {}", value)))
}

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

/// Reads an optional day. `null` and `""` are `None`; full timestamps keep
/// only their date part.
pub fn optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => parse_day(text).map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Reads a day, defaulting to today when missing or empty.
pub fn date_or_today<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    Ok(optional_date(deserializer)?.unwrap_or_else(today))
}

/// Parses `YYYY-MM-DD`, tolerating a trailing `T...` time component.
pub fn parse_day(text: &str) -> Result<NaiveDate, String> {
    let day = match text.split_once('T') {
        Some((day, _)) => day,
        None => text,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", text, e))
}
