// [libs/domain/models-rs/src/alert.rs]
/*!
 * =================================================================
 * APARATO: OPERATOR ALERT DOMAIN MODEL (V5.0 - PANOPTICON READY)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE NOTIFICACIÓN DERIVADA DE REGLAS
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{EventKind, SeverityLevel};

/// Notificación clasificada por severidad emitida hacia el panel de operadores.
/// La emisión está deduplicada por época de cooldown por (sesión, tipo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorAlert {
    /// Llave opaca universal de la alerta.
    pub alert_id: Uuid,
    /// Sesión propietaria (mismo tenant que la credencial consultante).
    pub session_id: Uuid,
    /// Tipo de señal que originó la regla.
    pub kind: EventKind,
    /// Severidad heredada de la decisión del motor de reglas.
    pub severity: SeverityLevel,
    /// Instante de emisión.
    pub created_at: DateTime<Utc>,
    /// Evento disparador, si la regla fue inducida por un evento concreto.
    pub triggering_event_id: Option<String>,
    /// Evidencia asociada; puede repararse post-hoc en el Summary Builder.
    pub evidence_id: Option<Uuid>,
    /// Contexto opaco de la decisión (incluye 'confidence' cuando existe).
    pub details: serde_json::Value,
}
