// [libs/domain/models-rs/src/batch.rs]
/*!
 * =================================================================
 * APARATO: BATCH ADMISSION WIRE CONTRACTS (V11.0 - PROTOCOL PINNED)
 * CLASIFICACIÓN: DOMAIN MODELS / DTO (ESTRATO L2)
 * RESPONSABILIDAD: FORMAS JSON NORMATIVAS DEL ENDPOINT DE INGESTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAMELCASE PARITY: El protocolo del cliente de examen es camelCase;
 *    estos DTO son la frontera exacta del contrato de red.
 * 2. ORDERED VERDICT: 'accepted' preserva el orden de llegada del cliente;
 *    'reason_by_event_id' usa BTreeMap para render determinista.
 * 3. STABLE TAGS: Las razones de rechazo son etiquetas snake_case
 *    estables consumidas por la lógica de reintento del cliente.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;
use uuid::Uuid;

/// Registro de evento tal como viaja en el lote del cliente.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEventRecord {
    /// Identificador global asignado por el cliente.
    #[serde(default)]
    pub event_id: String,
    /// Código del tipo de señal (taxonomía abierta).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Instante de detección ISO-8601.
    pub timestamp: DateTime<Utc>,
    /// Confianza del detector en [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Severidad declarada por el detector (opcional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Carga opaca clave -> valor.
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Miniatura probatoria adjunta al lote, referenciando su evento por id.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireThumbnailRecord {
    /// Evento al que pertenece la miniatura.
    pub event_id: String,
    /// Tipo MIME declarado (image/jpeg en v1).
    pub content_type: String,
    /// Bytes JPEG codificados en base64 estándar.
    pub data_base64: String,
    /// Tamaño declarado por el cliente (se verifica contra lo decodificado).
    #[typeshare(serialized_as = "number")]
    pub size_bytes: u64,
}

/// Lote de ingesta: eventos + miniaturas de una misma sesión.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Sesión declarada por el cliente; se liga contra la credencial.
    pub session_id: Uuid,
    /// Eventos en orden de emisión del cliente.
    #[serde(default)]
    pub events: Vec<WireEventRecord>,
    /// Miniaturas de evidencia opcionales.
    #[serde(default)]
    pub thumbnails: Vec<WireThumbnailRecord>,
}

/// Razones estables de rechazo por evento (§ contrato de reintento).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// El event_id ya fue observado dentro de la ventana de replay.
    Duplicate,
    /// |now - event_time| excede el sesgo temporal admitido (300 s).
    TimestampOutOfRange,
    /// El contador por sesión/minuto superó el cupo configurado.
    RateLimited,
    /// El registro es sintácticamente inválido para la admisión.
    PayloadInvalid,
    /// Fallo de almacén; el cliente debe reintentar con el mismo id.
    InternalError,
}

impl RejectionReason {
    /// Etiqueta estable expuesta al cliente.
    pub fn as_tag(&self) -> &'static str {
        match self {
            RejectionReason::Duplicate => "duplicate",
            RejectionReason::TimestampOutOfRange => "timestamp_out_of_range",
            RejectionReason::RateLimited => "rate_limited",
            RejectionReason::PayloadInvalid => "payload_invalid",
            RejectionReason::InternalError => "internal_error",
        }
    }
}

/// Veredicto del lote con semántica agnóstica de HTTP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchVerdict {
    /// Eventos admitidos, en el orden de llegada del cliente.
    pub accepted_event_ids: Vec<String>,
    /// Eventos rechazados, en el orden de llegada del cliente.
    pub rejected_event_ids: Vec<String>,
    /// Razón estable por cada evento rechazado.
    pub reason_by_event_id: BTreeMap<String, RejectionReason>,
}

impl BatchVerdict {
    /// Registra una admisión preservando el orden del cliente.
    pub fn admit(&mut self, event_id: &str) {
        self.accepted_event_ids.push(event_id.to_string());
    }

    /// Registra un rechazo con su razón estable.
    pub fn reject(&mut self, event_id: &str, reason: RejectionReason) {
        self.rejected_event_ids.push(event_id.to_string());
        self.reason_by_event_id.insert(event_id.to_string(), reason);
    }
}
