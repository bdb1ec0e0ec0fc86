// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Generic CRUD/query engine shared by the client and task collections.
//!
//! A collection is one JSON array under one store key. Every operation reads
//! the whole array, works on the in-memory copy and, for mutations, writes the
//! whole array back while holding the collection's lock.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CrmError, CrmResult};
use crate::kv::KeyValueStore;
use crate::query::{matches_criteria, matches_term, sort_records};

/// A record kind stored as a collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Name used in errors and logs.
    const ENTITY: &'static str;
    const STORAGE_KEY: &'static str;
    /// Order used when the caller does not ask for one.
    const DEFAULT_ORDER: &'static str;
    /// Fields searched when the caller does not list any.
    const SEARCH_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    /// Builds a record from a JSON object, applying defaults.
    fn from_fields(fields: Value) -> Result<Self, serde_json::Error>;

    fn check(&self) -> Result<(), Vec<String>>;

    /// Stamps the last-update time.
    fn touch(&mut self, at: DateTime<Utc>);
}

pub(crate) struct Collection<'a, R, S> {
    store: &'a S,
    lock: &'a ReentrantMutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record, S: KeyValueStore> Collection<'a, R, S> {
    pub(crate) fn new(store: &'a S, lock: &'a ReentrantMutex<()>) -> Self {
        Self {
            store,
            lock,
            _record: PhantomData,
        }
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'a, ()> {
        self.lock.lock()
    }

    pub(crate) fn load_all(&self) -> CrmResult<Vec<R>> {
        match self.store.load(R::STORAGE_KEY)? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn save_all(&self, records: &[R]) -> CrmResult<()> {
        let data = serde_json::to_string(records)?;
        self.store.save(R::STORAGE_KEY, &data)?;
        Ok(())
    }

    pub(crate) fn clear(&self) -> CrmResult<()> {
        self.store.remove(R::STORAGE_KEY)?;
        Ok(())
    }

    /// Validates and appends a new record. `unique` sees the candidate and the
    /// stored records and may veto the insert.
    pub(crate) fn create_with<F>(&self, fields: Value, unique: F) -> CrmResult<R>
    where
        F: Fn(&R, &[R]) -> CrmResult<()>,
    {
        let record = build::<R>(into_object(fields)?)?;
        record.check().map_err(CrmError::Validation)?;

        let _guard = self.lock();
        let mut records = self.load_all()?;
        unique(&record, &records)?;
        records.push(record.clone());
        self.save_all(&records)?;

        debug!("Created {} {}", R::ENTITY, record.id());
        Ok(record)
    }

    pub(crate) fn list(&self, order: &str) -> Vec<R> {
        match self.load_all() {
            Ok(records) => sort_records(records, order),
            Err(e) => {
                warn!("Failed to list {} records: {}", R::ENTITY, e);
                Vec::new()
            }
        }
    }

    pub(crate) fn find_by_id(&self, id: &str) -> CrmResult<R> {
        self.load_all()?
            .into_iter()
            .find(|record| record.id() == id)
            .ok_or_else(|| CrmError::not_found(R::ENTITY, id))
    }

    pub(crate) fn filter(&self, criteria: &Value, order: &str) -> Vec<R> {
        let Some(criteria) = criteria.as_object() else {
            warn!("Ignoring non-object {} filter: {}", R::ENTITY, criteria);
            return Vec::new();
        };
        let matching = self.retain(|fields| matches_criteria(fields, criteria));
        sort_records(matching, order)
    }

    pub(crate) fn search(&self, term: &str, fields: Option<&[&str]>) -> Vec<R> {
        let fields = fields.unwrap_or(R::SEARCH_FIELDS);
        self.retain(|record| matches_term(record, term, fields))
    }

    /// Merges `patch` over the stored record, re-stamps and re-validates it.
    ///
    /// `prepare` may rewrite the patch after seeing the current record; the
    /// `id` key of a patch is never applied.
    pub(crate) fn update_with<P, F>(
        &self,
        id: &str,
        patch: Value,
        prepare: P,
        unique: F,
    ) -> CrmResult<R>
    where
        P: FnOnce(&R, &mut Map<String, Value>),
        F: Fn(&R, &[R]) -> CrmResult<()>,
    {
        let mut patch = into_object(patch)?;

        let _guard = self.lock();
        let mut records = self.load_all()?;
        let index = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| CrmError::not_found(R::ENTITY, id))?;

        prepare(&records[index], &mut patch);

        let Value::Object(mut merged) = serde_json::to_value(&records[index])? else {
            return Err(CrmError::validation(format!("stored {} is not an object", R::ENTITY)));
        };
        for (key, value) in patch {
            if key != "id" {
                merged.insert(key, value);
            }
        }

        let mut updated = build::<R>(merged)?;
        updated.touch(common::fields::now());
        updated.check().map_err(CrmError::Validation)?;

        let others: Vec<R> = records
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, record)| record.clone())
            .collect();
        unique(&updated, &others)?;

        records[index] = updated.clone();
        self.save_all(&records)?;

        debug!("Updated {} {}", R::ENTITY, id);
        Ok(updated)
    }

    pub(crate) fn delete(&self, id: &str) -> CrmResult<R> {
        let _guard = self.lock();
        let mut records = self.load_all()?;
        let index = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| CrmError::not_found(R::ENTITY, id))?;

        let removed = records.remove(index);
        self.save_all(&records)?;

        debug!("Deleted {} {}", R::ENTITY, id);
        Ok(removed)
    }

    pub(crate) fn count(&self) -> CrmResult<usize> {
        Ok(self.load_all()?.len())
    }

    /// Records whose JSON projection satisfies `keep`; empty on read failure.
    fn retain<F>(&self, keep: F) -> Vec<R>
    where
        F: Fn(&Map<String, Value>) -> bool,
    {
        let records = match self.load_all() {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to read {} records: {}", R::ENTITY, e);
                return Vec::new();
            }
        };
        records
            .into_iter()
            .filter(|record| match serde_json::to_value(record) {
                Ok(Value::Object(fields)) => keep(&fields),
                _ => false,
            })
            .collect()
    }
}

fn into_object(value: Value) -> CrmResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CrmError::validation(format!("expected a JSON object, got {}", other))),
    }
}

/// Shape errors (wrong types, unknown status) are reported as validation
/// failures.
fn build<R: Record>(fields: Map<String, Value>) -> CrmResult<R> {
    R::from_fields(Value::Object(fields)).map_err(|e| CrmError::validation(e.to_string()))
}
