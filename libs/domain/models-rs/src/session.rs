// [libs/domain/models-rs/src/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION DOMAIN MODELS (V7.0 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS SOBERANOS DE SESIÓN DE EXAMEN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDENTITY TUPLE SSoT: La tupla (tenant, schedule, user, attempt)
 *    es la única llave lógica; el UUID es su proyección opaca.
 * 2. MONOTONE LIFECYCLE: El estatus fluye ACTIVE -> ENDED sin retorno;
 *    'ended_at' existe si y solo si el estatus es ENDED.
 * 3. NOMINAL PRECISION: Nomenclatura nominal absoluta en todos los campos.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Tupla de identidad lógica que ancla una sesión a su examen.
/// Única en todo el sistema: a lo sumo una sesión por tupla.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExamIdentityTuple {
    /// Identificador del tenant (institución u organización examinadora).
    pub tenant_id: String,
    /// Identificador de la convocatoria de examen programada.
    pub exam_schedule_id: String,
    /// Identificador del examinado dentro del tenant.
    pub user_id: String,
    /// Número de intento del examinado sobre la convocatoria.
    #[typeshare(serialized_as = "number")]
    pub attempt_no: i64,
}

/// Estados del ciclo de vida de una sesión de vigilancia.
#[typeshare]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// La sesión admite eventos, latidos y evaluación de reglas.
    Active,
    /// La sesión fue clausurada; toda escritura tardía es rechazada.
    Ended,
}

impl SessionStatus {
    /// Proyección textual estable para el Ledger relacional.
    pub fn as_code(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Ended => "ENDED",
        }
    }

    /// Reconstrucción desde la proyección textual del Ledger.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ACTIVE" => Some(SessionStatus::Active),
            "ENDED" => Some(SessionStatus::Ended),
            _ => None,
        }
    }
}

/// Sesión soberana de proctoring: el contexto activo de un intento de examen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProctoringSession {
    /// Llave opaca universal de la sesión.
    pub session_id: Uuid,
    /// Tupla de identidad lógica (única en el sistema).
    #[serde(flatten)]
    pub identity: ExamIdentityTuple,
    /// Estado actual del ciclo de vida.
    pub status: SessionStatus,
    /// Instante de creación de la sesión.
    pub started_at: DateTime<Utc>,
    /// Instante de clausura; presente si y solo si status = ENDED.
    pub ended_at: Option<DateTime<Utc>>,
    /// Último latido de vida recibido del cliente de examen.
    pub last_heartbeat_at: DateTime<Utc>,
    /// Acumulador de riesgo decadente, siempre no-negativo.
    pub current_risk_score: f64,
    /// Configuración opaca capturada en el arranque (clave -> valor).
    pub config_snapshot: serde_json::Value,
}

impl ProctoringSession {
    /// Evalúa si la tupla de identidad de la sesión coincide bit a bit
    /// con la tupla presentada por una credencial entrante.
    pub fn identity_matches(&self, presented_identity: &ExamIdentityTuple) -> bool {
        self.identity == *presented_identity
    }
}
