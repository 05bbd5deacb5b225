// [libs/domain/models-rs/src/snapshot.rs]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Instantánea append-only del acumulador de riesgo de una sesión.
/// Estrictamente ordenada por 'created_at' dentro de cada sesión.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScoreSnapshot {
    /// Llave opaca universal de la instantánea.
    pub snapshot_id: Uuid,
    /// Sesión propietaria.
    pub session_id: Uuid,
    /// Valor del acumulador en el instante del tick.
    pub score: f64,
    /// Instante del tick de snapshot.
    pub created_at: DateTime<Utc>,
    /// Contexto opaco del tick (conteos de ventana, origen del disparo).
    pub details: serde_json::Value,
}
