// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use common::Client;
use serde_json::Value;
use tracing::info;

use crate::collection::{Collection, Record};
use crate::error::{CrmError, CrmResult};
use crate::kv::KeyValueStore;
use crate::query::sort_records;
use crate::samples;

impl Record for Client {
    const ENTITY: &'static str = "client";
    const STORAGE_KEY: &'static str = "crm_clientes";
    const DEFAULT_ORDER: &'static str = "nombre_completo";
    const SEARCH_FIELDS: &'static [&'static str] = &["nombre_completo", "empresa", "email"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_fields(fields: Value) -> Result<Self, serde_json::Error> {
        Client::from_value(fields)
    }

    fn check(&self) -> Result<(), Vec<String>> {
        self.validate()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// No two clients may share an email address.
fn email_is_free(candidate: &Client, others: &[Client]) -> CrmResult<()> {
    if others.iter().any(|c| c.email == candidate.email) {
        return Err(CrmError::Conflict(format!(
            "a client with email {} already exists",
            candidate.email
        )));
    }
    Ok(())
}

/// Operations on the client collection.
pub struct Clients<'a, S> {
    collection: Collection<'a, Client, S>,
}

impl<'a, S: KeyValueStore> Clients<'a, S> {
    pub(crate) fn new(collection: Collection<'a, Client, S>) -> Self {
        Self { collection }
    }

    /// Creates a client from a JSON object of wire fields. A supplied `id` is
    /// kept; otherwise one is generated.
    pub fn create(&self, fields: Value) -> CrmResult<Client> {
        self.collection.create_with(fields, email_is_free)
    }

    /// All clients sorted by `order` (`"field"` or `"-field"`).
    pub fn list(&self, order: &str) -> Vec<Client> {
        self.collection.list(order)
    }

    /// All clients by name.
    pub fn all(&self) -> Vec<Client> {
        self.list(Client::DEFAULT_ORDER)
    }

    pub fn find_by_id(&self, id: &str) -> CrmResult<Client> {
        self.collection.find_by_id(id)
    }

    pub fn filter(&self, criteria: &Value, order: &str) -> Vec<Client> {
        self.collection.filter(criteria, order)
    }

    pub fn update(&self, id: &str, patch: Value) -> CrmResult<Client> {
        self.collection.update_with(id, patch, |_, _| {}, email_is_free)
    }

    /// Removes the client. Its tasks are left in place.
    pub fn delete(&self, id: &str) -> CrmResult<Client> {
        self.collection.delete(id)
    }

    /// Case-insensitive search over `fields`, by default name, company and
    /// email.
    pub fn search(&self, term: &str, fields: Option<&[&str]>) -> Vec<Client> {
        self.collection.search(term, fields)
    }

    pub fn count(&self) -> CrmResult<usize> {
        self.collection.count()
    }

    /// Adds the sample clients when the collection is empty. Returns how many
    /// were created.
    pub fn seed_samples(&self) -> CrmResult<usize> {
        let _guard = self.collection.lock();
        if self.collection.count()? > 0 {
            return Ok(0);
        }
        let samples = samples::clients();
        let created = samples.len();
        for fields in samples {
            self.create(fields)?;
        }
        info!("Seeded {} sample clients.", created);
        Ok(created)
    }

    /// Like [`Clients::list`] but surfaces read errors.
    pub(crate) fn load_sorted(&self, order: &str) -> CrmResult<Vec<Client>> {
        Ok(sort_records(self.collection.load_all()?, order))
    }

    pub(crate) fn clear(&self) -> CrmResult<()> {
        self.collection.clear()
    }
}
