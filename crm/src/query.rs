// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Ordering and matching over the JSON projection of records.
//!
//! Field names are the persisted (wire) names, so callers can sort or filter
//! on any stored attribute without a per-type accessor.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Value};

/// A parsed `order` argument: `"field"` ascends, `"-field"` descends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder<'a> {
    pub field: &'a str,
    pub descending: bool,
}

impl<'a> SortOrder<'a> {
    pub fn parse(order: &'a str) -> Self {
        match order.strip_prefix('-') {
            Some(field) => Self { field, descending: true },
            None => Self { field: order, descending: false },
        }
    }
}

/// Relational comparison of two field values.
///
/// Numbers compare numerically, strings lexically, `false < true`, and an
/// absent or null value sorts below anything present. Values of different
/// kinds are treated as equal.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Sorts records by one wire field. The sort is stable.
pub fn sort_records<R: Serialize>(records: Vec<R>, order: &str) -> Vec<R> {
    let order = SortOrder::parse(order);
    let mut keyed: Vec<(Option<Value>, R)> = records
        .into_iter()
        .map(|record| (field_of(&record, order.field), record))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = compare_values(a.as_ref(), b.as_ref());
        if order.descending { ord.reverse() } else { ord }
    });

    keyed.into_iter().map(|(_, record)| record).collect()
}

fn field_of<R: Serialize>(record: &R, field: &str) -> Option<Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(mut map)) => map.remove(field),
        _ => None,
    }
}

/// Text used for substring matching; containers and null have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Equality that treats `1500` and `1500.0` as the same amount.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// True when `record` satisfies every criterion.
///
/// A textual criterion is a case-insensitive substring match against the
/// field's text, and a blank field never matches one. Any other criterion
/// must equal the field's value.
pub fn matches_criteria(record: &Map<String, Value>, criteria: &Map<String, Value>) -> bool {
    criteria.iter().all(|(key, wanted)| {
        let Some(actual) = record.get(key) else {
            return wanted.is_null();
        };
        match wanted {
            Value::String(needle) => scalar_text(actual)
                .filter(|text| !text.is_empty())
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
            other => values_equal(actual, other),
        }
    })
}

/// True when any of `fields` contains `term`, ignoring case. Only non-empty
/// text fields take part.
pub fn matches_term(record: &Map<String, Value>, term: &str, fields: &[&str]) -> bool {
    let term = term.to_lowercase();
    fields.iter().any(|field| match record.get(*field) {
        Some(Value::String(text)) if !text.is_empty() => text.to_lowercase().contains(&term),
        _ => false,
    })
}
