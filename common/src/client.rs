// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::fields::{self, lenient_string, timestamp, whole_days};
use crate::validation::{into_result, require_email, require_text};

/// Alert threshold used when a client does not set one.
pub const DEFAULT_ALERT_DAYS: i64 = 7;

/// A client of the business.
///
/// Field names on the wire follow the persisted layout (`nombre_completo`,
/// `dias_alerta`, ...), which exports and existing stores depend on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Client {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,

    #[serde(rename = "nombre_completo", default, deserialize_with = "lenient_string")]
    pub full_name: String,

    #[serde(rename = "empresa", default, deserialize_with = "lenient_string")]
    pub company: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,

    #[serde(rename = "telefono", default, deserialize_with = "lenient_string")]
    pub phone: String,

    #[serde(rename = "direccion", default, deserialize_with = "lenient_string")]
    pub address: String,

    #[serde(rename = "ciudad", default, deserialize_with = "lenient_string")]
    pub city: String,

    #[serde(rename = "pais", default, deserialize_with = "lenient_string")]
    pub country: String,

    #[serde(rename = "notas", default, deserialize_with = "lenient_string")]
    pub notes: String,

    // Days a completed task may wait for payment before it is flagged.
    #[serde(
        rename = "dias_alerta",
        default = "default_alert_days",
        deserialize_with = "alert_days"
    )]
    pub alert_days: i64,

    #[serde(rename = "fecha_creacion", default = "fields::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "ultima_actualizacion", default = "fields::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_alert_days() -> i64 {
    DEFAULT_ALERT_DAYS
}

fn alert_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(whole_days(deserializer)?.unwrap_or(DEFAULT_ALERT_DAYS))
}

impl Client {
    pub const ID_PREFIX: &'static str = "cli";

    /// Builds a client from a JSON object, filling defaults and generating an
    /// id when none is supplied. Does not validate.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut client: Client = serde_json::from_value(value)?;
        if client.id.trim().is_empty() {
            client.id = fields::generate_id(Self::ID_PREFIX);
        }
        Ok(client)
    }

    /// Checks required fields and the email format.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        require_text(&self.full_name, "full name is required", &mut errors);
        require_email(&self.email, &mut errors);
        into_result(errors)
    }
}
