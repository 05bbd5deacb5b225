// [libs/infra/ephemeral/src/keyspace.rs]
/*!
 * APARATO: TACTICAL KEYSPACE CODEC
 * RESPONSABILIDAD: Construcción nominal de llaves del estrato efímero.
 *
 * Formatos de llave del protocolo:
 *   replay:{eventId}
 *   rate:{sessionId}:{minute}
 *   sw:{sessionId}:{type}
 *   alert-count:{sessionId}:{type}
 */

use uuid::Uuid;

/// Marcador de replay por evento (supresión de duplicados, TTL 1 h).
pub fn replay_marker(event_id: &str) -> String {
    format!("replay:{event_id}")
}

/// Contador de ráfaga por sesión y minuto epoch (TTL 2 min).
pub fn rate_counter(session_id: &Uuid, minute_bucket: i64) -> String {
    format!("rate:{session_id}:{minute_bucket}")
}

/// Ventana deslizante por (sesión, tipo) (TTL 4 h).
pub fn sliding_window(session_id: &Uuid, kind_code: &str) -> String {
    format!("sw:{session_id}:{kind_code}")
}

/// Gate de escalación de alertas por (sesión, tipo) (TTL de cooldown).
pub fn alert_gate(session_id: &Uuid, kind_code: &str) -> String {
    format!("alert-count:{session_id}:{kind_code}")
}
