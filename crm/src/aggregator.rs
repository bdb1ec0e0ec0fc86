// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Cross-collection operations: first-run seeding, wipe and reset,
//! whole-store export/import and reporting.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use common::fields::{self, timestamp};
use common::{Client, Task, TaskStatus, UserConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::collection::Record;
use crate::error::{CrmError, CrmResult};
use crate::kv::KeyValueStore;
use crate::tasks::TaskStats;
use crate::{user, Crm};

/// Version tag written into export envelopes.
pub const EXPORT_VERSION: &str = "1.0";

const TOP_CLIENTS: usize = 5;
const RECENT_TASKS: usize = 10;

/// What the store currently holds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataStatus {
    pub has_clientes: bool,
    pub has_tareas: bool,
    pub has_user: bool,
    pub clientes_count: usize,
    pub tareas_count: usize,
    /// No clients, no tasks and no user record.
    pub is_empty: bool,
}

/// Whole-store export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExportEnvelope {
    pub version: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub data: ExportData,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExportData {
    pub clientes: Vec<Client>,
    pub tareas: Vec<Task>,
    pub user: UserConfig,
}

/// How many records an import wrote.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub clientes: usize,
    pub tareas: usize,
    pub user: bool,
}

/// A client with the totals of its tasks.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ClientTotals {
    #[serde(flatten)]
    pub client: Client,
    #[serde(rename = "totalTareas")]
    pub task_count: usize,
    #[serde(rename = "totalCobrado")]
    pub collected: f64,
    #[serde(rename = "totalPendiente")]
    pub pending: f64,
    #[serde(rename = "totalGeneral")]
    pub total: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatsSummary {
    #[serde(rename = "totalClientes")]
    pub total_clients: usize,
    #[serde(rename = "totalTareas")]
    pub total_tasks: usize,
    #[serde(flatten)]
    pub tasks: TaskStats,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatsReport {
    #[serde(rename = "resumen")]
    pub summary: StatsSummary,
    #[serde(rename = "clientesTop")]
    pub top_clients: Vec<ClientTotals>,
    #[serde(rename = "tareasRecientes")]
    pub recent_tasks: Vec<Task>,
    #[serde(rename = "fecha_generacion", serialize_with = "timestamp::serialize")]
    pub generated_at: DateTime<Utc>,
}

/// A completed task that has waited too long for payment.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CollectionAlert {
    #[serde(rename = "tarea_id")]
    pub task_id: String,
    #[serde(rename = "cliente_id")]
    pub client_id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha_finalizacion")]
    pub completed_on: NaiveDate,
    #[serde(rename = "dias_pendiente")]
    pub days_pending: i64,
    #[serde(rename = "umbral")]
    pub threshold: i64,
}

impl<S: KeyValueStore> Crm<S> {
    /// Seeds the user, then sample clients and tasks into empty collections.
    pub fn initialize_all(&self) -> CrmResult<()> {
        let _locks = self.lock_all();
        info!("Initialising CRM data...");

        self.user().initialize()?;
        self.clients().seed_samples()?;
        let clients = self.clients().all();
        self.tasks().seed_samples(&clients)?;

        info!("CRM data initialised.");
        Ok(())
    }

    /// Runs [`Crm::initialize_all`] on an empty store; otherwise only makes
    /// sure the user exists.
    pub fn auto_initialize(&self) -> CrmResult<DataStatus> {
        let status = self.check_existing_data();
        if status.is_empty {
            info!("No existing data, initialising...");
            self.initialize_all()?;
        } else {
            info!(
                "Existing data found: {} clients, {} tasks.",
                status.clientes_count, status.tareas_count
            );
            if !status.has_user {
                self.user().initialize()?;
            }
        }
        Ok(self.check_existing_data())
    }

    /// Reports what is stored without changing anything.
    pub fn check_existing_data(&self) -> DataStatus {
        let clientes_count = self.clients().count().unwrap_or_else(|e| {
            warn!("Failed to count clients: {}", e);
            0
        });
        let tareas_count = self.tasks().count().unwrap_or_else(|e| {
            warn!("Failed to count tasks: {}", e);
            0
        });
        let has_user = self.user().exists().unwrap_or_else(|e| {
            warn!("Failed to check user: {}", e);
            false
        });

        DataStatus {
            has_clientes: clientes_count > 0,
            has_tareas: tareas_count > 0,
            has_user,
            clientes_count,
            tareas_count,
            is_empty: clientes_count == 0 && tareas_count == 0 && !has_user,
        }
    }

    /// Removes every client, task and the user record.
    pub fn clear_all_data(&self) -> CrmResult<()> {
        let _locks = self.lock_all();
        self.clients().clear()?;
        self.tasks().clear()?;
        self.user().clear()?;
        info!("All CRM data has been removed.");
        Ok(())
    }

    /// Clears everything and seeds the sample data again.
    pub fn reset_data(&self) -> CrmResult<()> {
        let _locks = self.lock_all();
        self.clear_all_data()?;
        self.initialize_all()
    }

    pub fn export_all_data(&self) -> CrmResult<ExportEnvelope> {
        let _locks = self.lock_all();
        let clientes = self.clients().load_sorted(Client::DEFAULT_ORDER)?;
        let tareas = self.tasks().load_sorted(Task::DEFAULT_ORDER)?;
        let user = self.user().me();

        info!("Exported {} clients and {} tasks.", clientes.len(), tareas.len());
        Ok(ExportEnvelope {
            version: EXPORT_VERSION.to_string(),
            timestamp: fields::now(),
            data: ExportData { clientes, tareas, user },
        })
    }

    /// Replaces the whole store with the contents of an export envelope.
    ///
    /// Records go through the normal validated create paths, keeping their ids.
    /// If any record is rejected the previous contents are written back and the
    /// error is returned.
    pub fn import_all_data(&self, envelope: &Value) -> CrmResult<ImportSummary> {
        let data = envelope
            .get("data")
            .filter(|data| data.is_object())
            .ok_or_else(|| CrmError::InvalidImport("missing 'data' object".to_string()))?;

        let _locks = self.lock_all();
        let snapshot = self.snapshot()?;

        match self.import_data(data) {
            Ok(summary) => {
                info!(
                    "Imported {} clients and {} tasks (user: {}).",
                    summary.clientes, summary.tareas, summary.user
                );
                Ok(summary)
            }
            Err(e) => {
                warn!("Import failed, restoring previous data: {}", e);
                if let Err(restore_err) = self.restore(&snapshot) {
                    error!("Failed to restore data after import failure: {}", restore_err);
                }
                Err(e)
            }
        }
    }

    fn import_data(&self, data: &Value) -> CrmResult<ImportSummary> {
        self.clear_all_data()?;
        let mut summary = ImportSummary::default();

        if let Some(user) = data.get("user").filter(|u| u.is_object()) {
            self.user().import_config(user.clone())?;
            summary.user = true;
        }
        if let Some(clientes) = data.get("clientes").and_then(Value::as_array) {
            for fields in clientes {
                self.clients().create(fields.clone())?;
                summary.clientes += 1;
            }
        }
        if let Some(tareas) = data.get("tareas").and_then(Value::as_array) {
            for fields in tareas {
                self.tasks().create(fields.clone())?;
                summary.tareas += 1;
            }
        }
        Ok(summary)
    }

    /// Every client with the totals of the tasks that reference it, in client
    /// name order.
    pub fn client_totals(&self) -> CrmResult<Vec<ClientTotals>> {
        let clients = self.clients().load_sorted(Client::DEFAULT_ORDER)?;
        let tasks = self.tasks().load_sorted(Task::DEFAULT_ORDER)?;
        Ok(totals_for(clients, &tasks))
    }

    /// Summary counts, the top clients by billed amount and the latest
    /// activity.
    pub fn generate_stats(&self) -> CrmResult<StatsReport> {
        let clients = self.clients().load_sorted(Client::DEFAULT_ORDER)?;
        let tasks = self.tasks().load_sorted(Task::DEFAULT_ORDER)?;

        let summary = StatsSummary {
            total_clients: clients.len(),
            total_tasks: tasks.len(),
            tasks: TaskStats::from_tasks(&tasks),
        };

        let mut top_clients = totals_for(clients, &tasks);
        top_clients.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
        top_clients.truncate(TOP_CLIENTS);

        let mut recent_tasks = tasks;
        recent_tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        recent_tasks.truncate(RECENT_TASKS);

        Ok(StatsReport {
            summary,
            top_clients,
            recent_tasks,
            generated_at: fields::now(),
        })
    }

    /// Completed tasks unpaid for at least their client's alert threshold,
    /// longest-waiting first. Tasks of unknown clients use the user's global
    /// threshold.
    pub fn collection_alerts(&self, today: NaiveDate) -> CrmResult<Vec<CollectionAlert>> {
        let thresholds: HashMap<String, i64> = self
            .clients()
            .load_sorted(Client::DEFAULT_ORDER)?
            .into_iter()
            .map(|client| (client.id, client.alert_days))
            .collect();
        let global = self.user().config().alert_days;

        let mut alerts: Vec<CollectionAlert> = self
            .tasks()
            .load_sorted(Task::DEFAULT_ORDER)?
            .into_iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .filter_map(|task| {
                let completed_on = task.completed_on?;
                let days_pending = (today - completed_on).num_days();
                let threshold = thresholds.get(&task.client_id).copied().unwrap_or(global);
                (days_pending >= threshold).then(|| CollectionAlert {
                    task_id: task.id,
                    client_id: task.client_id,
                    title: task.title,
                    amount: task.amount,
                    completed_on,
                    days_pending,
                    threshold,
                })
            })
            .collect();

        alerts.sort_by(|a, b| b.days_pending.cmp(&a.days_pending));
        Ok(alerts)
    }

    fn snapshot(&self) -> CrmResult<Vec<(&'static str, Option<String>)>> {
        [Client::STORAGE_KEY, Task::STORAGE_KEY, user::STORAGE_KEY]
            .into_iter()
            .map(|key| Ok((key, self.store().load(key)?)))
            .collect()
    }

    fn restore(&self, snapshot: &[(&'static str, Option<String>)]) -> CrmResult<()> {
        for (key, data) in snapshot {
            match data {
                Some(data) => self.store().save(key, data)?,
                None => self.store().remove(key)?,
            }
        }
        Ok(())
    }
}

/// Joins tasks to clients by `cliente_id`.
fn totals_for(clients: Vec<Client>, tasks: &[Task]) -> Vec<ClientTotals> {
    clients
        .into_iter()
        .map(|client| {
            let owned: Vec<&Task> = tasks.iter().filter(|t| t.client_id == client.id).collect();
            let collected: f64 = owned
                .iter()
                .filter(|t| t.status == TaskStatus::Collected)
                .map(|t| t.amount)
                .sum();
            let pending: f64 = owned
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .map(|t| t.amount)
                .sum();
            ClientTotals {
                task_count: owned.len(),
                collected,
                pending,
                total: collected + pending,
                client,
            }
        })
        .collect()
}
