// [apps/gateway/src/services/summary.rs]
/*!
 * =================================================================
 * APARATO: POST-SESSION SUMMARY BUILDER (V9.0 - DETERMINISTIC VIEW)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: TRUST SCORE, AGREGADOS Y REPARACIÓN DE EVIDENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TENANT SHIELD: El resumen de otra institución proyecta not_found
 *    (ocultación de existencia), jamás forbidden.
 * 2. POST-HOC REPAIR: Toda alerta sin evidencia se liga a la evidencia
 *    de la misma sesión más próxima en el tiempo (empate -> la más
 *    temprana); la reparación se persiste en la primera consulta.
 * 3. DETERMINISTIC AGGREGATES: Conteos por tipo en BTreeMap y lista de
 *    evidencia en orden de creación.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};
use typeshare::typeshare;
use uuid::Uuid;
use vigil_domain_models::claims::ExamClaims;
use vigil_domain_models::evidence::EvidenceArtifact;
use vigil_domain_rules::{extract_alert_confidence, trust_score};

/// Entrada de la lista ordenada de evidencia del resumen.
#[typeshare]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSummaryEntry {
    pub evidence_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[typeshare(serialized_as = "number")]
    pub byte_size: i64,
    pub mime_type: String,
}

/// Vista determinista post-sesión para el panel de operadores.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub tenant_id: String,
    pub exam_schedule_id: String,
    pub user_id: String,
    pub attempt_no: i64,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub current_risk_score: f64,
    /// Escalar derivado en [0, 100] (100 sin alertas con confianza).
    pub trust_score: u32,
    pub alert_counts_by_type: BTreeMap<String, u64>,
    pub evidence: Vec<EvidenceSummaryEntry>,
}

/**
 * Construye el resumen post-sesión, reparando primero el enlace de
 * evidencia de las alertas huérfanas.
 */
#[instrument(skip(state, claims), fields(session = %session_id))]
pub async fn build_summary(
    state: &AppState,
    session_id: &Uuid,
    claims: &ExamClaims,
) -> Result<SessionSummary, ApiError> {
    let session = state
        .session_repository
        .lookup(session_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if session.identity.tenant_id != claims.tenant_id {
        return Err(ApiError::NotFound);
    }

    let evidence_inventory = state.evidence_repository.list_by_session(session_id).await?;

    repair_evidence_linkage(state, session_id, &evidence_inventory).await?;

    // Las alertas se leen DESPUÉS de la reparación persistida.
    let alerts = state.alert_repository.list_by_session(session_id).await?;

    let alert_confidences: Vec<f64> = alerts
        .iter()
        .filter_map(|alert| extract_alert_confidence(&alert.details))
        .collect();

    let mut alert_counts_by_type: BTreeMap<String, u64> = BTreeMap::new();
    for alert in &alerts {
        *alert_counts_by_type.entry(alert.kind.as_code().to_string()).or_insert(0) += 1;
    }

    let evidence_entries = evidence_inventory
        .iter()
        .map(|artifact| EvidenceSummaryEntry {
            evidence_id: artifact.evidence_id,
            created_at: artifact.created_at,
            byte_size: artifact.byte_size,
            mime_type: artifact.mime_type.clone(),
        })
        .collect();

    Ok(SessionSummary {
        session_id: session.session_id,
        tenant_id: session.identity.tenant_id,
        exam_schedule_id: session.identity.exam_schedule_id,
        user_id: session.identity.user_id,
        attempt_no: session.identity.attempt_no,
        status: session.status.as_code().to_string(),
        started_at: session.started_at,
        ended_at: session.ended_at,
        last_heartbeat_at: session.last_heartbeat_at,
        current_risk_score: session.current_risk_score,
        trust_score: trust_score(&alert_confidences),
        alert_counts_by_type,
        evidence: evidence_entries,
    })
}

/**
 * Reparación post-hoc: liga cada alerta huérfana a la evidencia de la
 * sesión más próxima en el tiempo (empate -> la más temprana) y la
 * persiste. Idempotente: las alertas ya ligadas no se tocan.
 */
async fn repair_evidence_linkage(
    state: &AppState,
    session_id: &Uuid,
    evidence_inventory: &[EvidenceArtifact],
) -> Result<(), ApiError> {
    if evidence_inventory.is_empty() {
        return Ok(());
    }

    let orphan_alerts = state.alert_repository.list_unlinked(session_id).await?;
    if orphan_alerts.is_empty() {
        return Ok(());
    }

    let mut repaired_count = 0u64;
    for orphan_alert in &orphan_alerts {
        let nearest_artifact = evidence_inventory.iter().min_by_key(|artifact| {
            let temporal_distance =
                (artifact.created_at - orphan_alert.created_at).num_milliseconds().abs();
            // Empate de distancia: gana la evidencia más temprana.
            (temporal_distance, artifact.created_at)
        });

        if let Some(artifact) = nearest_artifact {
            if state
                .alert_repository
                .bind_evidence(&orphan_alert.alert_id, &artifact.evidence_id)
                .await?
            {
                repaired_count += 1;
            }
        }
    }

    if repaired_count > 0 {
        info!("🔧 [SUMMARY]: Repaired evidence linkage for {} alerts.", repaired_count);
    } else {
        debug!("🔧 [SUMMARY]: No orphan alerts required repair.");
    }

    Ok(())
}
