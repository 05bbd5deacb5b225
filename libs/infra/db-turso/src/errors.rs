// [libs/infra/db-turso/src/errors.rs]
/*!
 * =================================================================
 * APARATO: LEDGER ERROR CATALOG (V8.2 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SECOND LINE OF DEFENSE: Las violaciones de restricción única se
 *    proyectan como variantes semánticas (DuplicateEvent, IdentityTaken)
 *    para que la admisión las consuma sin inspeccionar SQL.
 * 2. PANOPTICON COMPLIANCE: Mensajes con prefijo de estrato para el
 *    renderizado cromático del panel de operadores.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    // --- ESTRATO DE SESIONES (L2/L3) ---

    /// La sesión solicitada no existe en el Ledger.
    #[error("[L3_SESSION_FAULT]: SESSION_NOT_FOUND")]
    SessionNotFound,

    /// La sesión fue clausurada; la escritura tardía es rechazada.
    #[error("[L3_SESSION_FAULT]: SESSION_ENDED")]
    SessionEnded,

    // --- ESTRATO DE EVENTOS Y EVIDENCIA ---

    /// El event_id ya posee una fila durable (idempotencia del Ledger).
    #[error("[L3_EVENT_FAULT]: DUPLICATE_EVENT_ID")]
    DuplicateEvent,

    /// El evento ya tiene evidencia enlazada (vínculo uno-a-uno).
    #[error("[L3_EVIDENCE_FAULT]: EVIDENCE_ALREADY_LINKED")]
    EvidenceAlreadyLinked,

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,
}

/// Detecta violaciones de restricción UNIQUE del motor SQLite/libSQL.
/// El Ledger las usa como segunda línea de defensa tras el replay marker.
pub fn is_unique_violation(database_fault: &libsql::Error) -> bool {
    let rendered_fault = database_fault.to_string();
    rendered_fault.contains("UNIQUE constraint failed")
        || rendered_fault.contains("constraint failed")
}
