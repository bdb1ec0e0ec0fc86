// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

// Same directory the data files have always lived in.
const DEFAULT_DATA_DIR: &str = "database";

pub const DATA_DIR_VAR: &str = "CRM_DATA_DIR";
pub const AUTO_INIT_VAR: &str = "CRM_AUTO_INIT";

/// Runtime settings for the `crm` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding one JSON file per store key.
    pub data_dir: PathBuf,
    /// Seed sample data into an empty store on start.
    pub auto_init: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            auto_init: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source; unset or blank values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(dir) = read(DATA_DIR_VAR) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = read(AUTO_INIT_VAR) {
            settings.auto_init = parse_flag(&flag)
                .with_context(|| format!("Invalid value for {}", AUTO_INIT_VAR))?;
        }
        Ok(settings)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.data_dir, PathBuf::from("database"));
        assert!(settings.auto_init);
    }

    #[test]
    fn test_reads_overrides() {
        let vars = [(DATA_DIR_VAR, "/tmp/crm"), (AUTO_INIT_VAR, "off")];
        let settings = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/crm"));
        assert!(!settings.auto_init);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let vars = [(DATA_DIR_VAR, "  "), (AUTO_INIT_VAR, "")];
        let settings = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_rejects_unknown_flag() {
        let err = Settings::from_lookup(lookup(&[(AUTO_INIT_VAR, "maybe")])).unwrap_err();
        assert!(format!("{:#}", err).contains("CRM_AUTO_INIT"));
    }
}
