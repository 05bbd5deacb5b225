// [libs/domain/models-rs/src/event.rs]
/*!
 * =================================================================
 * APARATO: ANOMALY EVENT DOMAIN MODELS (V9.2 - PRODUCTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS SOBERANOS DE SEÑALES DE ANOMALÍA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPEN TAXONOMY: Los tipos desconocidos se admiten y almacenan para
 *    auditoría sin atraer regla alguna (variante Unknown portadora).
 * 2. SEVERITY LATTICE: El orden derivado LOW < MEDIUM < HIGH < CRITICAL
 *    habilita la resolución max(declarada, computada) del motor de reglas.
 * 3. OPAQUE DETAILS: El mapa 'details' viaja como JSON serializado y solo
 *    se re-interpreta donde las reglas o el resumen leen claves concretas.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Taxonomía v1 de señales de anomalía producidas por el detector del cliente.
/// Los códigos no catalogados se preservan textualmente para auditoría.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Más de un rostro frente a la cámara (alerta inmediata).
    MultiPerson,
    /// Rostro del examinado ausente del encuadre.
    FaceMissing,
    /// Cámara obstruida u oscurecida deliberadamente.
    CameraBlocked,
    /// Cambio de pestaña o pérdida de foco del navegador.
    TabSwitch,
    /// Mirada sostenida fuera de la pantalla.
    LookAway,
    /// Iluminación insuficiente (solo registro, sin alerta).
    LowLight,
    /// Objeto sospechoso detectado en el encuadre.
    SuspiciousObject,
    /// Código no catalogado: se admite y almacena sin regla asociada.
    Unknown(String),
}

impl EventKind {
    /// Proyección textual estable (códigos de protocolo v1).
    pub fn as_code(&self) -> &str {
        match self {
            EventKind::MultiPerson => "MULTI_PERSON",
            EventKind::FaceMissing => "FACE_MISSING",
            EventKind::CameraBlocked => "CAMERA_BLOCKED",
            EventKind::TabSwitch => "TAB_SWITCH",
            EventKind::LookAway => "LOOK_AWAY",
            EventKind::LowLight => "LOW_LIGHT",
            EventKind::SuspiciousObject => "SUSPICIOUS_OBJECT",
            EventKind::Unknown(raw_code) => raw_code.as_str(),
        }
    }

    /// Reconstrucción desde el código de protocolo; nunca falla.
    pub fn from_code(code: &str) -> Self {
        match code {
            "MULTI_PERSON" => EventKind::MultiPerson,
            "FACE_MISSING" => EventKind::FaceMissing,
            "CAMERA_BLOCKED" => EventKind::CameraBlocked,
            "TAB_SWITCH" => EventKind::TabSwitch,
            "LOOK_AWAY" => EventKind::LookAway,
            "LOW_LIGHT" => EventKind::LowLight,
            "SUSPICIOUS_OBJECT" => EventKind::SuspiciousObject,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    /// Determina si el código pertenece a la taxonomía catalogada v1.
    pub fn is_catalogued(&self) -> bool {
        !matches!(self, EventKind::Unknown(_))
    }
}

impl From<String> for EventKind {
    fn from(code: String) -> Self {
        EventKind::from_code(&code)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_code().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_code())
    }
}

/// Retícula de severidad. El orden derivado es el orden semántico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Proyección textual estable para el Ledger y la API.
    pub fn as_code(&self) -> &'static str {
        match self {
            SeverityLevel::Low => "LOW",
            SeverityLevel::Medium => "MEDIUM",
            SeverityLevel::High => "HIGH",
            SeverityLevel::Critical => "CRITICAL",
        }
    }

    /// Reconstrucción tolerante desde el código textual.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LOW" => Some(SeverityLevel::Low),
            "MEDIUM" => Some(SeverityLevel::Medium),
            "HIGH" => Some(SeverityLevel::High),
            "CRITICAL" => Some(SeverityLevel::Critical),
            _ => None,
        }
    }
}

/// Evento de anomalía admitido y durable (una fila por event_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    /// Identificador global asignado por el cliente (llave de idempotencia).
    pub event_id: String,
    /// Sesión propietaria del evento.
    pub session_id: Uuid,
    /// Tipo de señal detectada.
    pub kind: EventKind,
    /// Instante de detección reportado por el cliente (determina la ventana).
    pub event_time: DateTime<Utc>,
    /// Severidad declarada por el detector (LOW si no fue reportada);
    /// la severidad final de una regla vive en la alerta que emite.
    pub severity: SeverityLevel,
    /// Confianza del detector en [0, 1], si fue reportada.
    pub confidence: Option<f64>,
    /// Carga opaca clave -> valor del detector.
    pub details: serde_json::Value,
    /// Evidencia vinculada (se fija a lo sumo una vez, post-ingesta).
    pub evidence_id: Option<Uuid>,
    /// Instante de escritura durable en el Ledger.
    pub created_at: DateTime<Utc>,
}
