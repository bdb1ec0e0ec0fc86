// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::fields::{self, lenient_string, timestamp, whole_days};
use crate::validation::{into_result, require_email, require_text};

/// Id of the one and only user record.
pub const USER_ID: &str = "user_1";

pub const MIN_ALERT_DAYS: i64 = 1;
pub const MAX_ALERT_DAYS: i64 = 365;

/// Profile and preferences of the person running the CRM.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserConfig {
    #[serde(default = "default_id", deserialize_with = "text_or_id")]
    pub id: String,

    #[serde(rename = "nombre", default = "default_name", deserialize_with = "text_or_name")]
    pub name: String,

    #[serde(default = "default_email", deserialize_with = "text_or_email")]
    pub email: String,

    #[serde(rename = "empresa", default = "default_company", deserialize_with = "text_or_company")]
    pub company: String,

    #[serde(
        rename = "dias_alerta_global",
        default = "default_alert_days",
        deserialize_with = "alert_days"
    )]
    pub alert_days: i64,

    #[serde(rename = "tema", default = "default_theme", deserialize_with = "text_or_theme")]
    pub theme: String,

    #[serde(rename = "idioma", default = "default_locale", deserialize_with = "text_or_locale")]
    pub locale: String,

    #[serde(
        rename = "notificaciones_email",
        default = "default_true",
        deserialize_with = "flag_or_true"
    )]
    pub email_notifications: bool,

    #[serde(rename = "fecha_creacion", default = "fields::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "ultima_actualizacion", default = "fields::now", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// The preference subset of [`UserConfig`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Preferences {
    #[serde(rename = "dias_alerta_global")]
    pub alert_days: i64,
    #[serde(rename = "tema")]
    pub theme: String,
    #[serde(rename = "idioma")]
    pub locale: String,
    #[serde(rename = "notificaciones_email")]
    pub email_notifications: bool,
}

fn default_id() -> String {
    USER_ID.to_string()
}
fn default_name() -> String {
    "Usuario".to_string()
}
fn default_email() -> String {
    "usuario@crm.com".to_string()
}
fn default_company() -> String {
    "Mi Empresa".to_string()
}
fn default_alert_days() -> i64 {
    7
}
fn default_theme() -> String {
    "light".to_string()
}
fn default_locale() -> String {
    "es".to_string()
}
fn default_true() -> bool {
    true
}

// Blank text falls back to the default, like a missing key.
fn text_or<'de, D: Deserializer<'de>>(
    deserializer: D,
    default: fn() -> String,
) -> Result<String, D::Error> {
    let text = lenient_string(deserializer)?;
    Ok(if text.is_empty() { default() } else { text })
}

fn text_or_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text_or(d, default_id)
}
fn text_or_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text_or(d, default_name)
}
fn text_or_email<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text_or(d, default_email)
}
fn text_or_company<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text_or(d, default_company)
}
fn text_or_theme<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text_or(d, default_theme)
}
fn text_or_locale<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    text_or(d, default_locale)
}

fn alert_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(whole_days(deserializer)?.unwrap_or_else(default_alert_days))
}

fn flag_or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl Default for UserConfig {
    fn default() -> Self {
        let now = fields::now();
        Self {
            id: default_id(),
            name: default_name(),
            email: default_email(),
            company: default_company(),
            alert_days: default_alert_days(),
            theme: default_theme(),
            locale: default_locale(),
            email_notifications: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UserConfig {
    /// Profile written the first time the CRM is initialised.
    pub fn seed() -> Self {
        Self {
            name: "Usuario CRM".to_string(),
            email: "admin@crm.local".to_string(),
            company: "Mi Empresa CRM".to_string(),
            ..Self::default()
        }
    }

    /// Builds the user from a JSON object; missing fields take their defaults.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            alert_days: self.alert_days,
            theme: self.theme.clone(),
            locale: self.locale.clone(),
            email_notifications: self.email_notifications,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        require_text(&self.name, "name is required", &mut errors);
        require_email(&self.email, &mut errors);
        if !(MIN_ALERT_DAYS..=MAX_ALERT_DAYS).contains(&self.alert_days) {
            errors.push(format!(
                "alert days must be between {} and {}",
                MIN_ALERT_DAYS, MAX_ALERT_DAYS
            ));
        }
        into_result(errors)
    }
}
