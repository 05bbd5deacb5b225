// [apps/gateway/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V7.0 - DUAL PATH ENABLED)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE MOTORES Y DAEMONS
 *
 * # Topología de Módulos:
 * - admission:       Pipeline de admisión de lotes (dedup, ráfaga, límites).
 * - event_stream:    Stream particionado por sesión de eventos admitidos.
 * - rules_consumer:  Flota de consumidores asíncronos (uno por partición).
 * - rules_engine:    Evaluación compartida: ventanas, alertas, riesgo.
 * - session_sweeper: Clausura de sesiones sin latido y janitor de caché.
 * - summary:         Resumen post-sesión con trust score y reparación.
 * =================================================================
 */

pub mod admission;
pub mod event_stream;
pub mod rules_consumer;
pub mod rules_engine;
pub mod session_sweeper;
pub mod summary;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use event_stream::EventStreamHub;
pub use rules_consumer::spawn_rules_consumer_fleet;
pub use rules_engine::RulesEngine;
pub use session_sweeper::spawn_session_sweeper;
