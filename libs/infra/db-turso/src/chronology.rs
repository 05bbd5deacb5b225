// [libs/infra/db-turso/src/chronology.rs]
/*!
 * APARATO: CANONICAL CHRONOLOGY CODEC
 * RESPONSABILIDAD: Proyección temporal bit-estable para el Ledger.
 *
 * Las marcas se almacenan como RFC-3339 UTC con precisión fija de
 * microsegundos: ancho constante, por lo que el orden lexicográfico
 * de la columna coincide con el orden cronológico.
 */

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::DbError;

/// Proyecta un instante al formato canónico del Ledger.
pub fn encode_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reconstruye un instante desde la proyección canónica.
pub fn decode_instant(encoded: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(encoded)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|parse_fault| {
            DbError::MappingError(format!("TIMESTAMP_DECODE_FAILURE [{encoded}]: {parse_fault}"))
        })
}

/// Reconstruye un instante opcional (columnas NULL del Ledger).
pub fn decode_optional_instant(encoded: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
    encoded.map(|text| decode_instant(&text)).transpose()
}
