// [libs/infra/db-turso/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V6.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel file actúa como una interfaz galvánica. Los sub-módulos
 * permanecen aislados, y solo las estructuras de autoridad
 * (Repositories) son expuestas al exterior, reduciendo el acoplamiento.
 * =================================================================
 */

// --- ESTRATO 1: CICLO DE VIDA DE SESIÓN ---

/// Identidad, ciclo de vida monótono y acumulador de riesgo.
pub mod session;

// --- ESTRATO 2: ESCRITURA DURABLE (WRITER) ---

/// Filas idempotentes de eventos de anomalía (una por event_id).
pub mod event;
/// Metadatos de miniaturas probatorias y enlace uno-a-uno.
pub mod evidence;

// --- ESTRATO 3: LECTURA DE OPERADOR (PANOPTICON) ---

/// Alertas clasificadas por severidad para el panel.
pub mod alert;
/// Instantáneas append-only del acumulador de riesgo.
pub mod snapshot;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use alert::AlertRepository;
pub use event::EventRepository;
pub use evidence::EvidenceRepository;
pub use session::SessionRepository;
pub use snapshot::SnapshotRepository;
