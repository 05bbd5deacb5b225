// [apps/gateway/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HANDLER ORCHESTRATION HUB (V6.0 - COMPLETE MATRIX)
 * CLASIFICACIÓN: APPLICATION ADAPTERS (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE PUNTOS DE ENTRADA
 *
 * # Topología de Módulos:
 * - sessions:  Ciclo de vida de sesión (start / end / heartbeat).
 * - ingest:    Admisión de lotes de eventos con miniaturas.
 * - review:    Lecturas tenant-scoped de alertas, eventos y evidencia.
 * - dashboard: Resumen post-sesión con trust score.
 * - devtools:  Forja de credenciales (solo perfiles de desarrollo).
 * =================================================================
 */

pub mod dashboard;
pub mod devtools;
pub mod ingest;
pub mod review;
pub mod sessions;
