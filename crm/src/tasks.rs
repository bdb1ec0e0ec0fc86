// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc};
use common::{fields, Client, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::collection::{Collection, Record};
use crate::error::CrmResult;
use crate::kv::KeyValueStore;
use crate::query::sort_records;
use crate::samples;

impl Record for Task {
    const ENTITY: &'static str = "task";
    const STORAGE_KEY: &'static str = "crm_tareas";
    const DEFAULT_ORDER: &'static str = "-ultima_actualizacion";
    const SEARCH_FIELDS: &'static [&'static str] = &["titulo", "descripcion"];

    fn id(&self) -> &str {
        &self.id
    }

    fn from_fields(fields: Value) -> Result<Self, serde_json::Error> {
        Task::from_value(fields)
    }

    fn check(&self) -> Result<(), Vec<String>> {
        self.validate()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Counts and amounts per status.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    #[serde(rename = "iniciadas")]
    pub started: usize,
    #[serde(rename = "en_proceso")]
    pub in_progress: usize,
    #[serde(rename = "finalizadas")]
    pub completed: usize,
    #[serde(rename = "cobradas")]
    pub collected: usize,
    /// Sum of collected task amounts.
    #[serde(rename = "total_cobrado")]
    pub total_collected: f64,
    /// Sum of completed-but-unpaid task amounts.
    #[serde(rename = "total_pendiente")]
    pub total_pending: f64,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut stats = TaskStats {
            total: tasks.len(),
            ..Default::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Started => stats.started += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => {
                    stats.completed += 1;
                    stats.total_pending += task.amount;
                }
                TaskStatus::Collected => {
                    stats.collected += 1;
                    stats.total_collected += task.amount;
                }
            }
        }
        stats
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Date stamps implied by a status change in `patch`.
///
/// Completing a task stamps its completion date; collecting it stamps the
/// collection date and, when the task was never marked complete, the
/// completion date too. Dates the patch already carries win.
fn derive_status_dates(current: &Task, patch: &mut Map<String, Value>, today: NaiveDate) {
    let today = Value::String(today.to_string());
    match patch.get("estado").and_then(Value::as_str) {
        Some("finalizada") if is_blank(patch.get("fecha_finalizacion")) => {
            patch.insert("fecha_finalizacion".into(), today);
        }
        Some("cobrada") if is_blank(patch.get("fecha_cobro")) => {
            patch.insert("fecha_cobro".into(), today.clone());
            if current.completed_on.is_none() && is_blank(patch.get("fecha_finalizacion")) {
                patch.insert("fecha_finalizacion".into(), today);
            }
        }
        _ => {}
    }
}

/// Operations on the task collection.
pub struct Tasks<'a, S> {
    collection: Collection<'a, Task, S>,
}

impl<'a, S: KeyValueStore> Tasks<'a, S> {
    pub(crate) fn new(collection: Collection<'a, Task, S>) -> Self {
        Self { collection }
    }

    /// Creates a task. The owning client is not looked up.
    pub fn create(&self, fields: Value) -> CrmResult<Task> {
        self.collection.create_with(fields, |_, _| Ok(()))
    }

    pub fn list(&self, order: &str) -> Vec<Task> {
        self.collection.list(order)
    }

    /// All tasks, most recently updated first.
    pub fn all(&self) -> Vec<Task> {
        self.list(Task::DEFAULT_ORDER)
    }

    pub fn find_by_id(&self, id: &str) -> CrmResult<Task> {
        self.collection.find_by_id(id)
    }

    pub fn filter(&self, criteria: &Value, order: &str) -> Vec<Task> {
        self.collection.filter(criteria, order)
    }

    /// Merges `patch` into the task, applying the status date stamps.
    pub fn update(&self, id: &str, patch: Value) -> CrmResult<Task> {
        let today = fields::today();
        self.collection.update_with(
            id,
            patch,
            |current, patch| derive_status_dates(current, patch, today),
            |_, _| Ok(()),
        )
    }

    pub fn delete(&self, id: &str) -> CrmResult<Task> {
        self.collection.delete(id)
    }

    /// Case-insensitive search over `fields`, by default title and description.
    pub fn search(&self, term: &str, fields: Option<&[&str]>) -> Vec<Task> {
        self.collection.search(term, fields)
    }

    /// Tasks owned by one client, most recently updated first.
    pub fn by_client(&self, client_id: &str) -> Vec<Task> {
        self.collection
            .list(Task::DEFAULT_ORDER)
            .into_iter()
            .filter(|task| task.client_id == client_id)
            .collect()
    }

    pub fn stats(&self) -> TaskStats {
        match self.collection.load_all() {
            Ok(tasks) => TaskStats::from_tasks(&tasks),
            Err(e) => {
                warn!("Failed to compute task stats: {}", e);
                TaskStats::default()
            }
        }
    }

    pub fn count(&self) -> CrmResult<usize> {
        self.collection.count()
    }

    /// Adds the sample tasks when there are none and at least one client
    /// exists. Tasks are assigned to `clients` by position.
    pub fn seed_samples(&self, clients: &[Client]) -> CrmResult<usize> {
        let _guard = self.collection.lock();
        if clients.is_empty() || self.collection.count()? > 0 {
            return Ok(0);
        }
        let ids: Vec<&str> = clients.iter().map(|c| c.id.as_str()).collect();
        let samples = samples::tasks(&ids);
        let created = samples.len();
        for fields in samples {
            self.create(fields)?;
        }
        info!("Seeded {} sample tasks.", created);
        Ok(created)
    }

    /// Tasks sorted by `order`; used by the aggregator, which wants errors.
    pub(crate) fn load_sorted(&self, order: &str) -> CrmResult<Vec<Task>> {
        Ok(sort_records(self.collection.load_all()?, order))
    }

    pub(crate) fn clear(&self) -> CrmResult<()> {
        self.collection.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::{Crm, CrmError};
    use serde_json::json;
    use std::thread;
    use std::time::Duration;

    fn crm() -> Crm<MemoryStore> {
        Crm::new(MemoryStore::new())
    }

    fn audit(client_id: &str) -> Value {
        json!({
            "cliente_id": client_id,
            "titulo": "Auditoría interna",
            "descripcion": "Revisión de procesos",
            "monto": 3500.0,
            "fecha_inicio": "2024-10-05"
        })
    }

    #[test]
    fn test_create_applies_defaults_and_allows_unknown_client() {
        let crm = crm();
        let task = crm.tasks().create(audit("cli_does_not_exist")).unwrap();
        assert_eq!(task.status, TaskStatus::Started);
        assert_eq!(task.completed_on, None);
        assert_eq!(crm.tasks().find_by_id(&task.id).unwrap(), task);
    }

    #[test]
    fn test_create_rejects_negative_amount_and_bad_status() {
        let crm = crm();
        let err = crm
            .tasks()
            .create(json!({ "cliente_id": "c", "titulo": "t", "monto": -1 }))
            .unwrap_err();
        assert_eq!(err.to_string(), "amount cannot be negative");

        let err = crm
            .tasks()
            .create(json!({ "cliente_id": "c", "titulo": "t", "estado": "pagada" }))
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(crm.tasks().count().unwrap(), 0);
    }

    #[test]
    fn test_collecting_stamps_both_dates() {
        let crm = crm();
        let task = crm.tasks().create(audit("cli_1")).unwrap();

        let updated = crm.tasks().update(&task.id, json!({ "estado": "cobrada" })).unwrap();
        let today = fields::today();
        assert_eq!(updated.status, TaskStatus::Collected);
        assert_eq!(updated.collected_on, Some(today));
        assert_eq!(updated.completed_on, Some(today));
    }

    #[test]
    fn test_collecting_keeps_existing_completion_date() {
        let crm = crm();
        let task = crm.tasks().create(audit("cli_1")).unwrap();
        crm.tasks()
            .update(&task.id, json!({ "estado": "finalizada", "fecha_finalizacion": "2024-09-30" }))
            .unwrap();

        let updated = crm.tasks().update(&task.id, json!({ "estado": "cobrada" })).unwrap();
        assert_eq!(updated.completed_on, NaiveDate::from_ymd_opt(2024, 9, 30));
        assert_eq!(updated.collected_on, Some(fields::today()));
    }

    #[test]
    fn test_completing_stamps_today_unless_given() {
        let crm = crm();
        let a = crm.tasks().create(audit("cli_1")).unwrap();
        let b = crm.tasks().create(audit("cli_1")).unwrap();

        let a = crm.tasks().update(&a.id, json!({ "estado": "finalizada" })).unwrap();
        assert_eq!(a.completed_on, Some(fields::today()));
        assert_eq!(a.collected_on, None);

        let b = crm
            .tasks()
            .update(&b.id, json!({ "estado": "finalizada", "fecha_finalizacion": "2024-01-02" }))
            .unwrap();
        assert_eq!(b.completed_on, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_status_can_move_backwards() {
        let crm = crm();
        let task = crm.tasks().create(audit("cli_1")).unwrap();
        crm.tasks().update(&task.id, json!({ "estado": "cobrada" })).unwrap();
        let reopened = crm.tasks().update(&task.id, json!({ "estado": "en_proceso" })).unwrap();
        assert_eq!(reopened.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_failed_update_leaves_task_untouched() {
        let crm = crm();
        let task = crm.tasks().create(audit("cli_1")).unwrap();
        let err = crm.tasks().update(&task.id, json!({ "monto": -5 })).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(crm.tasks().find_by_id(&task.id).unwrap(), task);
    }

    #[test]
    fn test_filter_by_status_and_title() {
        let crm = crm();
        let a = crm.tasks().create(audit("cli_1")).unwrap();
        crm.tasks()
            .create(json!({ "cliente_id": "cli_2", "titulo": "Configuración sistema contable" }))
            .unwrap();
        crm.tasks().update(&a.id, json!({ "estado": "finalizada" })).unwrap();

        let done = crm.tasks().filter(&json!({ "estado": "finalizada" }), "-ultima_actualizacion");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a.id);

        let config = crm.tasks().filter(&json!({ "titulo": "config" }), "titulo");
        assert_eq!(config.len(), 1);
        assert_eq!(config[0].client_id, "cli_2");
    }

    #[test]
    fn test_by_client_uses_exact_id() {
        let crm = crm();
        crm.tasks().create(audit("cli_1")).unwrap();
        crm.tasks().create(audit("cli_12")).unwrap();
        assert_eq!(crm.tasks().by_client("cli_1").len(), 1);
        assert!(crm.tasks().by_client("cli_").is_empty());
    }

    #[test]
    fn test_list_by_update_timestamp() {
        let crm = crm();
        let mut ids = Vec::new();
        for title in ["primera", "segunda", "tercera"] {
            let task = crm
                .tasks()
                .create(json!({ "cliente_id": "cli_1", "titulo": title }))
                .unwrap();
            ids.push(task.id);
            thread::sleep(Duration::from_millis(5));
        }
        crm.tasks()
            .update(&ids[0], json!({ "descripcion": "revisada" }))
            .unwrap();

        let newest_first = crm.tasks().list("-ultima_actualizacion");
        assert_eq!(newest_first.len(), 3);
        assert_eq!(newest_first[0].id, ids[0]);
        assert!(newest_first
            .windows(2)
            .all(|pair| pair[0].updated_at >= pair[1].updated_at));

        let oldest_first = crm.tasks().list("ultima_actualizacion");
        assert_eq!(oldest_first[2].id, ids[0]);
        assert!(oldest_first
            .windows(2)
            .all(|pair| pair[0].updated_at <= pair[1].updated_at));
    }

    #[test]
    fn test_stats_by_status() {
        let crm = crm();
        for (title, status, amount) in
            [("a", "cobrada", 100), ("b", "finalizada", 50), ("c", "en_proceso", 10)]
        {
            crm.tasks()
                .create(json!({
                    "cliente_id": "c",
                    "titulo": title,
                    "estado": status,
                    "monto": amount
                }))
                .unwrap();
        }

        let stats = crm.tasks().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.collected, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.started, 0);
        assert_eq!(stats.total_collected, 100.0);
        assert_eq!(stats.total_pending, 50.0);
    }

    #[test]
    fn test_reads_degrade_to_empty_on_corrupt_collection() {
        let store = MemoryStore::new();
        store.save(Task::STORAGE_KEY, "{ not json").unwrap();
        let crm = Crm::new(store);

        assert!(crm.tasks().all().is_empty());
        assert!(crm.tasks().search("x", None).is_empty());
        assert!(crm.tasks().filter(&json!({}), "titulo").is_empty());
        assert_eq!(crm.tasks().stats(), TaskStats::default());
        assert!(crm.tasks().find_by_id("t").is_err());
    }
}
