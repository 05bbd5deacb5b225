// [libs/domain/models-rs/src/evidence.rs]
/*!
 * =================================================================
 * APARATO: EVIDENCE DOMAIN MODEL (V4.1 - IMMUTABLE ARTIFACT)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE MINIATURA PROBATORIA INMUTABLE
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Miniatura probatoria inmutable, uno-a-uno con su evento generador.
/// El digest SHA-256 certifica la integridad de los bytes almacenados.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceArtifact {
    /// Llave opaca universal de la evidencia.
    pub evidence_id: Uuid,
    /// Sesión propietaria del artefacto.
    pub session_id: Uuid,
    /// Tamaño exacto en bytes del blob (cota blanda 10 KiB por evento).
    pub byte_size: i64,
    /// Digest SHA-256 hexadecimal de los bytes del blob.
    pub sha256_digest: String,
    /// Tipo MIME del artefacto (siempre image/jpeg en v1).
    pub mime_type: String,
    /// Instante de creación; el artefacto nunca muta después.
    pub created_at: DateTime<Utc>,
    /// Localizador opaco dentro de la bóveda de blobs.
    pub storage_locator: String,
}
