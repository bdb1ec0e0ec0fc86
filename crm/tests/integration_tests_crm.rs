// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use common::TaskStatus;
use crm::{Crm, CrmError, FileStore, KeyValueStore, MemoryStore};
use serde_json::{json, Value};
use tempfile::tempdir;

/// Opens a fresh CRM over the given directory.
fn open(dir: &Path) -> Crm<FileStore> {
    Crm::new(FileStore::new(dir))
}

#[test]
fn test_data_survives_reopening_the_store() {
    let dir = tempdir().unwrap();

    let client_id = {
        let crm = open(dir.path());
        crm.auto_initialize().unwrap();
        let client = crm
            .clients()
            .create(json!({ "nombre_completo": "Ana Torres", "email": "ana@torres.com" }))
            .unwrap();
        crm.tasks()
            .create(json!({ "cliente_id": client.id, "titulo": "Alta", "monto": "250.5" }))
            .unwrap();
        client.id
    };

    let crm = open(dir.path());
    let status = crm.check_existing_data();
    assert_eq!(status.clientes_count, 4);
    assert_eq!(status.tareas_count, 5);
    assert!(status.has_user);

    let tasks = crm.tasks().by_client(&client_id);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].amount, 250.5);

    for key in ["crm_clientes", "crm_tareas", "crm_user_config"] {
        assert!(dir.path().join(format!("{}.json", key)).exists(), "missing {}", key);
    }
}

#[test]
fn test_persisted_layout_uses_wire_names() {
    let dir = tempdir().unwrap();
    let crm = open(dir.path());
    crm.tasks()
        .create(json!({ "cliente_id": "cli_1", "titulo": "Informe", "fecha_inicio": "2024-10-01" }))
        .unwrap();

    let raw = fs::read_to_string(dir.path().join("crm_tareas.json")).unwrap();
    let stored: Value = serde_json::from_str(&raw).unwrap();
    let task = &stored[0];
    assert_eq!(task["cliente_id"], "cli_1");
    assert_eq!(task["estado"], "iniciada");
    assert_eq!(task["fecha_inicio"], "2024-10-01");
    assert!(task["fecha_creacion"].as_str().unwrap().ends_with('Z'));
    assert!(task["id"].as_str().unwrap().starts_with("tarea_"));
}

#[test]
fn test_hand_edited_documents_are_read_leniently() {
    let store = MemoryStore::new();
    let legacy = json!([{
        "id": "cli_legacy",
        "nombre_completo": "Legacy",
        "email": "old@mail.com",
        "telefono": 12345,
        "dias_alerta": null,
        "fecha_creacion": "",
        "ultima_actualizacion": null
    }]);
    store.save("crm_clientes", &legacy.to_string()).unwrap();
    let crm = Crm::new(store);

    let client = crm.clients().find_by_id("cli_legacy").unwrap();
    assert_eq!(client.phone, "12345");
    assert_eq!(client.alert_days, 7);
    assert_eq!(client.company, "");
}

#[test]
fn test_task_lifecycle_and_alerts() {
    let crm = Crm::new(MemoryStore::new());
    crm.user().initialize().unwrap();
    let client = crm
        .clients()
        .create(json!({
            "nombre_completo": "Taller Sur",
            "email": "taller@sur.com",
            "dias_alerta": 5
        }))
        .unwrap();
    let task = crm
        .tasks()
        .create(json!({ "cliente_id": client.id, "titulo": "Web", "monto": 900 }))
        .unwrap();

    let task = crm
        .tasks()
        .update(&task.id, json!({ "estado": "finalizada", "fecha_finalizacion": "2024-03-01" }))
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let march_3 = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
    let march_10 = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    assert!(crm.collection_alerts(march_3).unwrap().is_empty());
    let alerts = crm.collection_alerts(march_10).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].days_pending, 9);
    assert_eq!(alerts[0].threshold, 5);

    let task = crm.tasks().update(&task.id, json!({ "estado": "cobrada" })).unwrap();
    assert_eq!(task.completed_on, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert!(task.collected_on.is_some());
    assert!(crm.collection_alerts(march_10).unwrap().is_empty());

    let stats = crm.generate_stats().unwrap();
    assert_eq!(stats.summary.tasks.total_collected, 900.0);
    assert_eq!(stats.top_clients[0].collected, 900.0);
}

#[test]
fn test_export_to_another_store() {
    let source = Crm::new(MemoryStore::new());
    source.initialize_all().unwrap();
    source.user().update_config(json!({ "tema": "dark" })).unwrap();
    let envelope = serde_json::to_value(source.export_all_data().unwrap()).unwrap();
    assert_eq!(envelope["version"], "1.0");
    assert_eq!(envelope["data"]["clientes"].as_array().unwrap().len(), 3);

    let dir = tempdir().unwrap();
    let target = open(dir.path());
    let summary = target.import_all_data(&envelope).unwrap();
    assert_eq!(summary.clientes, 3);
    assert_eq!(summary.tareas, 4);

    assert_eq!(target.user().config().theme, "dark");
    assert_eq!(target.clients().all(), source.clients().all());
    assert_eq!(target.tasks().all(), source.tasks().all());
}

#[test]
fn test_import_with_invalid_task_keeps_existing_files() {
    let dir = tempdir().unwrap();
    let crm = open(dir.path());
    crm.initialize_all().unwrap();
    let before = fs::read_to_string(dir.path().join("crm_clientes.json")).unwrap();

    let bad = json!({
        "version": "1.0",
        "timestamp": "2024-10-01T00:00:00.000Z",
        "data": {
            "clientes": [{ "nombre_completo": "Nuevo", "email": "nuevo@mail.com" }],
            "tareas": [{ "cliente_id": "cli_x", "titulo": "" }]
        }
    });
    let err = crm.import_all_data(&bad).unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    let after = fs::read_to_string(dir.path().join("crm_clientes.json")).unwrap();
    assert_eq!(after, before);
    assert_eq!(crm.tasks().count().unwrap(), 4);
}

#[test]
fn test_clear_removes_files() {
    let dir = tempdir().unwrap();
    let crm = open(dir.path());
    crm.initialize_all().unwrap();
    crm.clear_all_data().unwrap();

    assert!(crm.check_existing_data().is_empty);
    assert!(!dir.path().join("crm_clientes.json").exists());
    assert!(!dir.path().join("crm_user_config.json").exists());
}

#[test]
fn test_import_accepts_alert_days_written_as_float_or_text() {
    let crm = Crm::new(MemoryStore::new());
    let envelope = json!({
        "version": "1.0",
        "data": {
            "clientes": [
                { "id": "cli_a", "nombre_completo": "A", "email": "a@a.com", "dias_alerta": 7.0 },
                { "id": "cli_b", "nombre_completo": "B", "email": "b@b.com", "dias_alerta": "5" }
            ],
            "tareas": [],
            "user": { "dias_alerta_global": "10" }
        }
    });

    let summary = crm.import_all_data(&envelope).unwrap();
    assert_eq!(summary.clientes, 2);
    assert_eq!(crm.clients().find_by_id("cli_a").unwrap().alert_days, 7);
    assert_eq!(crm.clients().find_by_id("cli_b").unwrap().alert_days, 5);
    assert_eq!(crm.user().config().alert_days, 10);
}
