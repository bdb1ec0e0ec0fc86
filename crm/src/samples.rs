// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Demo records written on first start.

use serde_json::{json, Value};

pub(crate) fn clients() -> Vec<Value> {
    vec![
        json!({
            "nombre_completo": "Juan Pérez",
            "empresa": "Tecnologías Avanzadas S.A.",
            "email": "juan.perez@tecavanzadas.com",
            "telefono": "+1234567890",
            "direccion": "Av. Libertad 123",
            "ciudad": "Buenos Aires",
            "pais": "Argentina",
            "notas": "Cliente desde 2020, muy puntual con los pagos",
            "dias_alerta": 5
        }),
        json!({
            "nombre_completo": "María García",
            "empresa": "Consultoría García",
            "email": "maria@consultoriagarcia.com",
            "telefono": "+1234567891",
            "direccion": "Calle Principal 456",
            "ciudad": "Madrid",
            "pais": "España",
            "notas": "Requiere atención personalizada",
            "dias_alerta": 7
        }),
        json!({
            "nombre_completo": "Carlos Rodríguez",
            "empresa": "Emprendimientos CR",
            "email": "carlos.rodriguez@empcr.com",
            "telefono": "+1234567892",
            "direccion": "Zona Industrial 789",
            "ciudad": "Monterrey",
            "pais": "México",
            "notas": "Cliente nuevo, potencial alto volumen",
            "dias_alerta": 10
        }),
    ]
}

/// Sample tasks for the given client ids. The second and third clients fall
/// back to the first when fewer are available. `client_ids` must not be empty.
pub(crate) fn tasks(client_ids: &[&str]) -> Vec<Value> {
    let first = client_ids[0];
    let second = client_ids.get(1).copied().unwrap_or(first);
    let third = client_ids.get(2).copied().unwrap_or(first);

    vec![
        json!({
            "cliente_id": first,
            "titulo": "Configuración sistema contable",
            "descripcion": "Instalación y configuración del nuevo sistema contable para la empresa",
            "estado": "en_proceso",
            "monto": 1500.00,
            "fecha_inicio": "2024-10-01"
        }),
        json!({
            "cliente_id": first,
            "titulo": "Capacitación equipo",
            "descripcion": "Capacitación del equipo en el uso del nuevo sistema",
            "estado": "finalizada",
            "monto": 800.00,
            "fecha_inicio": "2024-09-15",
            "fecha_finalizacion": "2024-09-30"
        }),
        json!({
            "cliente_id": second,
            "titulo": "Consultoría fiscal",
            "descripcion": "Asesoramiento fiscal para el cierre del ejercicio",
            "estado": "cobrada",
            "monto": 2200.00,
            "fecha_inicio": "2024-09-01",
            "fecha_finalizacion": "2024-09-20",
            "fecha_cobro": "2024-09-25"
        }),
        json!({
            "cliente_id": third,
            "titulo": "Auditoría interna",
            "descripcion": "Auditoría de procesos internos y recomendaciones de mejora",
            "estado": "iniciada",
            "monto": 3500.00,
            "fecha_inicio": "2024-10-05"
        }),
    ]
}
