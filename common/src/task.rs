// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{
    self, amount, date_or_today, lenient_string, null_as_default, optional_date, timestamp,
};
use crate::validation::{into_result, require_text};

/// Billing lifecycle of a task.
///
/// Any status may be set directly; the only side effects of a change are the
/// date stamps applied when a task is updated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "iniciada")]
    Started,
    #[serde(rename = "en_proceso")]
    InProgress,
    /// Work delivered, payment pending.
    #[serde(rename = "finalizada")]
    Completed,
    /// Work delivered and paid.
    #[serde(rename = "cobrada")]
    Collected,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Started,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Collected,
    ];

    /// The persisted name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Started => "iniciada",
            TaskStatus::InProgress => "en_proceso",
            TaskStatus::Completed => "finalizada",
            TaskStatus::Collected => "cobrada",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "status must be one of: iniciada, en_proceso, finalizada, cobrada (got '{}')",
                    s
                )
            })
    }
}

/// A unit of billable work done for a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,

    // Not checked against the client collection; may point at a deleted client.
    #[serde(rename = "cliente_id", default, deserialize_with = "lenient_string")]
    pub client_id: String,

    #[serde(rename = "titulo", default, deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(rename = "descripcion", default, deserialize_with = "lenient_string")]
    pub description: String,

    #[serde(rename = "estado", default, deserialize_with = "null_as_default")]
    pub status: TaskStatus,

    #[serde(rename = "monto", default, deserialize_with = "amount")]
    pub amount: f64,

    #[serde(rename = "fecha_inicio", default = "fields::today", deserialize_with = "date_or_today")]
    pub start_date: NaiveDate,

    #[serde(rename = "fecha_finalizacion", default, deserialize_with = "optional_date")]
    pub completed_on: Option<NaiveDate>,

    #[serde(rename = "fecha_cobro", default, deserialize_with = "optional_date")]
    pub collected_on: Option<NaiveDate>,

    #[serde(rename = "fecha_creacion", default = "fields::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "ultima_actualizacion", default = "fields::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub const ID_PREFIX: &'static str = "tarea";

    /// Builds a task from a JSON object, filling defaults and generating an id
    /// when none is supplied. Does not validate.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut task: Task = serde_json::from_value(value)?;
        if task.id.trim().is_empty() {
            task.id = fields::generate_id(Self::ID_PREFIX);
        }
        Ok(task)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        require_text(&self.client_id, "client id is required", &mut errors);
        require_text(&self.title, "title is required", &mut errors);
        if self.amount < 0.0 {
            errors.push("amount cannot be negative".to_string());
        } else if !self.amount.is_finite() {
            errors.push("amount must be a finite number".to_string());
        }
        into_result(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let task = Task::from_value(json!({ "cliente_id": "cli_1", "titulo": "Audit" })).unwrap();
        assert!(task.id.starts_with("tarea_"));
        assert_eq!(task.status, TaskStatus::Started);
        assert_eq!(task.amount, 0.0);
        assert_eq!(task.start_date, fields::today());
        assert_eq!(task.completed_on, None);
        assert_eq!(task.collected_on, None);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_status_wire_names() {
        let task = Task::from_value(json!({
            "cliente_id": "cli_1",
            "titulo": "Audit",
            "estado": "cobrada",
            "fecha_cobro": "2024-09-25"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Collected);

        let out = serde_json::to_value(&task).unwrap();
        assert_eq!(out["estado"], "cobrada");
        assert_eq!(out["fecha_cobro"], "2024-09-25");
        assert_eq!(out["fecha_finalizacion"], Value::Null);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result =
            Task::from_value(json!({ "cliente_id": "c", "titulo": "t", "estado": "archivada" }));
        assert!(result.is_err());
        assert!("archivada".parse::<TaskStatus>().is_err());
        assert_eq!("en_proceso".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
    }

    #[test]
    fn test_negative_amount_fails_validation() {
        let task =
            Task::from_value(json!({ "cliente_id": "", "titulo": "t", "monto": -10 })).unwrap();
        let errors = task.validate().unwrap_err();
        assert_eq!(errors, vec!["client id is required", "amount cannot be negative"]);
    }
}
