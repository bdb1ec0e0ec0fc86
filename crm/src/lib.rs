// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Persistence and query layer for the CRM records.
//!
//! Clients and tasks are kept as JSON collections in a [`KeyValueStore`], next
//! to a single user profile. [`Crm`] owns the store and hands out short-lived
//! handles for each collection:
//!
//! ```no_run
//! use crm::{Crm, MemoryStore};
//! use serde_json::json;
//!
//! let crm = Crm::new(MemoryStore::new());
//! crm.auto_initialize()?;
//! let client = crm.clients().create(json!({
//!     "nombre_completo": "Ana Torres",
//!     "email": "ana@torres.com"
//! }))?;
//! crm.tasks().create(json!({ "cliente_id": client.id, "titulo": "Alta" }))?;
//! # Ok::<(), crm::CrmError>(())
//! ```

pub mod aggregator;
mod clients;
pub mod collection;
pub mod config;
mod error;
pub mod kv;
mod query;
mod samples;
mod tasks;
mod user;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

pub use aggregator::{
    ClientTotals, CollectionAlert, DataStatus, ExportData, ExportEnvelope, ImportSummary,
    StatsReport, StatsSummary,
};
pub use clients::Clients;
pub use collection::Record;
pub use error::{CrmError, CrmResult};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use tasks::{TaskStats, Tasks};
pub use user::{UserSettings, CONFIG_FIELDS, PROFILE_FIELDS};

use collection::Collection;

/// Entry point to the CRM data.
///
/// Each collection has its own lock; a mutation holds it across its
/// read-modify-write. Cross-collection operations take all of them in the
/// order clients, tasks, user.
pub struct Crm<S> {
    store: S,
    clients_lock: ReentrantMutex<()>,
    tasks_lock: ReentrantMutex<()>,
    user_lock: ReentrantMutex<()>,
}

impl<S: KeyValueStore> Crm<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clients_lock: ReentrantMutex::new(()),
            tasks_lock: ReentrantMutex::new(()),
            user_lock: ReentrantMutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clients(&self) -> Clients<'_, S> {
        Clients::new(Collection::new(&self.store, &self.clients_lock))
    }

    pub fn tasks(&self) -> Tasks<'_, S> {
        Tasks::new(Collection::new(&self.store, &self.tasks_lock))
    }

    pub fn user(&self) -> UserSettings<'_, S> {
        UserSettings::new(&self.store, &self.user_lock)
    }

    pub(crate) fn lock_all(
        &self,
    ) -> (
        ReentrantMutexGuard<'_, ()>,
        ReentrantMutexGuard<'_, ()>,
        ReentrantMutexGuard<'_, ()>,
    ) {
        (self.clients_lock.lock(), self.tasks_lock.lock(), self.user_lock.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_handles_share_one_store() {
        let crm = Crm::new(MemoryStore::new());
        let client = crm
            .clients()
            .create(json!({ "nombre_completo": "Ana", "email": "ana@mail.com" }))
            .unwrap();
        crm.tasks()
            .create(json!({ "cliente_id": client.id, "titulo": "Alta" }))
            .unwrap();

        assert!(crm.store().load("crm_clientes").unwrap().is_some());
        assert!(crm.store().load("crm_tareas").unwrap().is_some());
        assert_eq!(crm.tasks().by_client(&client.id).len(), 1);
    }

    #[test]
    fn test_concurrent_creates_are_not_lost() {
        let crm = Arc::new(Crm::new(MemoryStore::new()));
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let crm = Arc::clone(&crm);
                thread::spawn(move || {
                    for j in 0..10 {
                        crm.tasks()
                            .create(json!({
                                "cliente_id": format!("cli_{}", i),
                                "titulo": format!("t{}", j)
                            }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(crm.tasks().count().unwrap(), 80);
    }
}
