// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! The singleton user profile.
//!
//! Absence of the record is not an error: readers fall back to the default
//! profile, and `me` persists it on first use.

use common::{fields, Preferences, UserConfig};
use parking_lot::ReentrantMutex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{CrmError, CrmResult};
use crate::kv::KeyValueStore;

pub(crate) const STORAGE_KEY: &str = "crm_user_config";

/// Fields `update_config` may change.
pub const CONFIG_FIELDS: &[&str] =
    &["dias_alerta_global", "tema", "idioma", "notificaciones_email"];

/// Fields `update_profile` may change.
pub const PROFILE_FIELDS: &[&str] = &["nombre", "email", "empresa"];

/// Operations on the user profile.
pub struct UserSettings<'a, S> {
    store: &'a S,
    lock: &'a ReentrantMutex<()>,
}

impl<'a, S: KeyValueStore> UserSettings<'a, S> {
    pub(crate) fn new(store: &'a S, lock: &'a ReentrantMutex<()>) -> Self {
        Self { store, lock }
    }

    pub(crate) fn load(&self) -> CrmResult<Option<UserConfig>> {
        match self.store.load(STORAGE_KEY)? {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    fn save(&self, user: &UserConfig) -> CrmResult<()> {
        let data = serde_json::to_string(user)?;
        self.store.save(STORAGE_KEY, &data)?;
        Ok(())
    }

    pub fn exists(&self) -> CrmResult<bool> {
        Ok(self.store.load(STORAGE_KEY)?.is_some())
    }

    /// The stored profile, creating and saving the default one if none exists.
    /// Store failures yield an unsaved default.
    pub fn me(&self) -> UserConfig {
        let _guard = self.lock.lock();
        match self.load() {
            Ok(Some(user)) => user,
            Ok(None) => {
                let user = UserConfig::default();
                if let Err(e) = self.save(&user) {
                    warn!("Failed to persist default user: {}", e);
                }
                user
            }
            Err(e) => {
                warn!("Failed to read user, using defaults: {}", e);
                UserConfig::default()
            }
        }
    }

    /// Writes the first-run profile if no user exists yet and returns the
    /// current one.
    pub fn initialize(&self) -> CrmResult<UserConfig> {
        let _guard = self.lock.lock();
        if let Some(user) = self.load()? {
            return Ok(user);
        }
        let user = UserConfig::seed();
        self.save(&user)?;
        info!("Initialised user profile for {}", user.email);
        Ok(user)
    }

    /// Applies any field of `patch` except `id`.
    pub fn update(&self, patch: Value) -> CrmResult<UserConfig> {
        self.apply(patch, None)
    }

    /// Applies the preference fields of `patch`; other keys are ignored.
    pub fn update_config(&self, patch: Value) -> CrmResult<UserConfig> {
        self.apply(patch, Some(CONFIG_FIELDS))
    }

    /// Applies the profile fields of `patch`; other keys are ignored.
    pub fn update_profile(&self, patch: Value) -> CrmResult<UserConfig> {
        self.apply(patch, Some(PROFILE_FIELDS))
    }

    /// Preference subset, defaults when no user is stored.
    pub fn config(&self) -> Preferences {
        match self.load() {
            Ok(Some(user)) => user.preferences(),
            Ok(None) => UserConfig::default().preferences(),
            Err(e) => {
                warn!("Failed to read user preferences: {}", e);
                UserConfig::default().preferences()
            }
        }
    }

    pub fn reset_to_defaults(&self) -> CrmResult<UserConfig> {
        let _guard = self.lock.lock();
        let user = UserConfig::default();
        self.save(&user)?;
        info!("User profile reset to defaults");
        Ok(user)
    }

    /// The stored profile, or the default one. Never writes.
    pub fn export_config(&self) -> UserConfig {
        match self.load() {
            Ok(Some(user)) => user,
            Ok(None) => UserConfig::default(),
            Err(e) => {
                warn!("Failed to read user for export: {}", e);
                UserConfig::default()
            }
        }
    }

    /// Replaces the profile with `config` after validating it.
    pub fn import_config(&self, config: Value) -> CrmResult<UserConfig> {
        let user = UserConfig::from_value(config).map_err(|e| CrmError::validation(e.to_string()))?;
        user.validate().map_err(CrmError::Validation)?;

        let _guard = self.lock.lock();
        self.save(&user)?;
        debug!("Imported user profile {}", user.id);
        Ok(user)
    }

    pub(crate) fn clear(&self) -> CrmResult<()> {
        self.store.remove(STORAGE_KEY)?;
        Ok(())
    }

    fn apply(&self, patch: Value, allowed: Option<&[&str]>) -> CrmResult<UserConfig> {
        let Value::Object(patch) = patch else {
            return Err(CrmError::validation("expected a JSON object"));
        };

        let _guard = self.lock.lock();
        let current = self.load()?.unwrap_or_default();
        let Value::Object(mut merged) = serde_json::to_value(&current)? else {
            return Err(CrmError::validation("stored user is not an object"));
        };
        merge_allowed(&mut merged, patch, allowed);

        let mut user = UserConfig::from_value(Value::Object(merged))
            .map_err(|e| CrmError::validation(e.to_string()))?;
        user.updated_at = fields::now();
        user.validate().map_err(CrmError::Validation)?;

        self.save(&user)?;
        debug!("Updated user profile");
        Ok(user)
    }
}

fn merge_allowed(
    target: &mut Map<String, Value>,
    patch: Map<String, Value>,
    allowed: Option<&[&str]>,
) {
    for (key, value) in patch {
        let permitted = match allowed {
            Some(fields) => fields.contains(&key.as_str()),
            None => key != "id",
        };
        if permitted {
            target.insert(key, value);
        }
    }
}
