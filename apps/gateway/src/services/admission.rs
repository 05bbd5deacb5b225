// [apps/gateway/src/services/admission.rs]
/*!
 * =================================================================
 * APARATO: BATCH ADMISSION PIPELINE (V14.0 - SWISS PRECISION)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DEDUP, RÁFAGA, LÍMITES, PERSISTENCIA Y EVIDENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LOCK-FREE HOT PATH: La deduplicación y el cupo de ráfaga son
 *    operaciones atómicas de llave única en la caché táctica; la
 *    restricción UNIQUE del Ledger es la segunda línea de defensa.
 * 2. CLIENT ORDER PRESERVED: El veredicto reproduce el orden de
 *    llegada; el primer event_id repetido dentro del lote gana.
 * 3. RETRY CONTRACT: Todo rechazo distinto de 'duplicate' libera el
 *    marcador de replay para que el cliente reintente con el mismo id.
 * 4. EVIDENCE NEVER DEMOTES: Un fallo de miniatura se traza y no
 *    degrada el evento ya durable.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use vigil_domain_models::batch::{BatchRequest, BatchVerdict, RejectionReason, WireThumbnailRecord};
use vigil_domain_models::claims::ExamClaims;
use vigil_domain_models::event::{AnomalyEvent, EventKind, SeverityLevel};
use vigil_domain_models::evidence::EvidenceArtifact;
use vigil_domain_models::session::SessionStatus;
use vigil_infra_blobstore::compute_sha256_digest;
use vigil_infra_db::DbError;

/// Cota blanda por miniatura (10 KiB de bytes decodificados).
const THUMBNAIL_SOFT_CAP_BYTES: usize = 10 * 1024;

/**
 * Admite un lote completo: guardas de petición, bucle por evento en
 * orden del cliente y bucle de miniaturas sobre los admitidos.
 *
 * `serialized_request_bytes` es el tamaño del cuerpo tal como llegó
 * por la red (la guarda de 64 KiB opera sobre la serialización).
 */
#[instrument(skip(state, claims, batch), fields(session = %batch.session_id, events = batch.events.len()))]
pub async fn admit_batch(
    state: &AppState,
    claims: &ExamClaims,
    serialized_request_bytes: usize,
    batch: BatchRequest,
) -> Result<BatchVerdict, ApiError> {
    let now = Utc::now();

    // 1. GUARDA DE TAMAÑO: el lote completo se rechaza por exceso.
    if serialized_request_bytes > state.config.max_batch_bytes {
        return Err(ApiError::BatchTooLarge);
    }

    // 2. LIGADURA DE IDENTIDAD: sesión declarada vs credencial.
    let session = state
        .session_repository
        .lookup(&batch.session_id)
        .await?
        .ok_or(ApiError::SessionNotFound)?;

    if !session.identity_matches(&claims.identity_tuple()) {
        warn!("🛡️ [ADMISSION]: Identity mismatch for session {}.", batch.session_id);
        return Err(ApiError::IdentityMismatch);
    }

    if session.status == SessionStatus::Ended {
        return Err(ApiError::SessionEnded);
    }

    // 3. CUPO PRE-AGOTADO (ruta whole-batch): si la época del minuto ya
    //    está saturada antes de procesar, el lote entero se rechaza.
    let minute_bucket = now.timestamp() / 60;
    if !batch.events.is_empty() {
        let live_rate = state
            .tactical_cache
            .current_rate(&batch.session_id, minute_bucket, now)
            .await?;
        if live_rate >= state.config.max_events_per_minute {
            return Err(ApiError::RateLimited);
        }
    }

    // Un lote válido cuenta como señal de vida de la sesión.
    state
        .session_repository
        .touch_heartbeat(&batch.session_id, now)
        .await?;

    // 4. BUCLE POR EVENTO (orden del cliente preservado).
    let mut verdict = BatchVerdict::default();

    for wire_event in &batch.events {
        // a. Identificador ausente: descarte silencioso.
        if wire_event.event_id.trim().is_empty() {
            debug!("⚪ [ADMISSION]: Blank event_id skipped silently.");
            continue;
        }
        let event_id = wire_event.event_id.as_str();

        // b. SUPRESIÓN DE REPLAY: set-if-absent atómico con TTL 1 h.
        //    Cubre también los repetidos dentro del mismo lote (gana el primero).
        let marker_acquired = state
            .tactical_cache
            .acquire_replay_marker(event_id, state.config.replay_ttl, now)
            .await?;
        if !marker_acquired {
            verdict.reject(event_id, RejectionReason::Duplicate);
            continue;
        }

        // c. SESGO TEMPORAL: |now − event_time| ≤ 300 s.
        let skew_seconds = (now - wire_event.timestamp).num_seconds().abs();
        if skew_seconds > state.config.time_skew.as_secs() as i64 {
            verdict.reject(event_id, RejectionReason::TimestampOutOfRange);
            state.tactical_cache.release_replay_marker(event_id).await?;
            continue;
        }

        // d. CUPO DE RÁFAGA: incremento atómico por (sesión, minuto).
        let rate_position = state
            .tactical_cache
            .increment_rate_counter(&batch.session_id, minute_bucket, state.config.rate_counter_ttl, now)
            .await?;
        if rate_position > state.config.max_events_per_minute {
            verdict.reject(event_id, RejectionReason::RateLimited);
            state.tactical_cache.release_replay_marker(event_id).await?;
            continue;
        }

        // e. PERSISTENCIA DURABLE (una transacción por evento).
        let declared_severity = wire_event
            .severity
            .as_deref()
            .and_then(SeverityLevel::from_code)
            .unwrap_or(SeverityLevel::Low);

        let event = AnomalyEvent {
            event_id: event_id.to_string(),
            session_id: batch.session_id,
            kind: EventKind::from_code(&wire_event.event_type),
            event_time: wire_event.timestamp,
            severity: declared_severity,
            confidence: wire_event.confidence.map(|c| c.clamp(0.0, 1.0)),
            details: serde_json::Value::Object(wire_event.details.clone()),
            evidence_id: None,
            created_at: now,
        };

        match state.event_repository.insert_event(&event).await {
            Ok(()) => {}
            Err(DbError::DuplicateEvent) => {
                // Segunda línea de defensa: fila durable previa.
                verdict.reject(event_id, RejectionReason::Duplicate);
                continue;
            }
            Err(persistence_fault) => {
                warn!("⚠️ [ADMISSION]: Durable write failed for [{}]: {}", event_id, persistence_fault);
                verdict.reject(event_id, RejectionReason::InternalError);
                state.tactical_cache.release_replay_marker(event_id).await?;
                continue;
            }
        }

        verdict.admit(event_id);

        // f. HOOK INLINE DE REGLAS: el fallo se traza, jamás se surfacea.
        if let Err(rules_fault) = state.rules_engine.evaluate(&event).await {
            warn!("⚠️ [ADMISSION]: Inline rule hook fault for [{}]: {}", event_id, rules_fault);
        }

        // Publicación al stream particionado (ruta asíncrona durable).
        state.event_stream.publish(event);
    }

    // 5. BUCLE DE MINIATURAS sobre los eventos admitidos.
    for thumbnail in &batch.thumbnails {
        if !verdict.accepted_event_ids.iter().any(|id| id == &thumbnail.event_id) {
            continue;
        }
        ingest_thumbnail(state, &batch.session_id, thumbnail).await;
    }

    info!("📦 [ADMISSION]: Batch sealed: {} accepted / {} rejected.",
        verdict.accepted_event_ids.len(), verdict.rejected_event_ids.len());

    Ok(verdict)
}

/**
 * Ingesta de una miniatura: decodificación, cota, digest, blob y
 * fila de Evidence + back-link en una transacción. Todo fallo aquí
 * se traza sin degradar el evento admitido.
 */
async fn ingest_thumbnail(state: &AppState, session_id: &Uuid, thumbnail: &WireThumbnailRecord) {
    if thumbnail.content_type != "image/jpeg" {
        warn!("⚪ [EVIDENCE]: Thumbnail for [{}] rejected: unsupported content type [{}].",
            thumbnail.event_id, thumbnail.content_type);
        return;
    }

    let decoded_bytes = match BASE64_STANDARD.decode(&thumbnail.data_base64) {
        Ok(bytes) => bytes,
        Err(decode_fault) => {
            warn!("⚪ [EVIDENCE]: Thumbnail for [{}] undecodable: {}.", thumbnail.event_id, decode_fault);
            return;
        }
    };

    if decoded_bytes.len() > THUMBNAIL_SOFT_CAP_BYTES {
        warn!("⚪ [EVIDENCE]: Thumbnail for [{}] over the {} byte cap ({} bytes).",
            thumbnail.event_id, THUMBNAIL_SOFT_CAP_BYTES, decoded_bytes.len());
        return;
    }

    if thumbnail.size_bytes as usize != decoded_bytes.len() {
        debug!("⚠️ [EVIDENCE]: Declared size {} differs from decoded {} for [{}].",
            thumbnail.size_bytes, decoded_bytes.len(), thumbnail.event_id);
    }

    let sha256_digest = compute_sha256_digest(&decoded_bytes);

    let storage_locator = match state
        .evidence_vault
        .put(session_id, &thumbnail.event_id, &decoded_bytes)
        .await
    {
        Ok(locator) => locator,
        Err(vault_fault) => {
            warn!("⚠️ [EVIDENCE]: Blob write failed for [{}]: {}.", thumbnail.event_id, vault_fault);
            return;
        }
    };

    let artifact = EvidenceArtifact {
        evidence_id: Uuid::new_v4(),
        session_id: *session_id,
        byte_size: decoded_bytes.len() as i64,
        sha256_digest,
        mime_type: thumbnail.content_type.clone(),
        created_at: Utc::now(),
        storage_locator,
    };

    if let Err(backlink_fault) = state
        .evidence_repository
        .store_with_backlink(&artifact, &thumbnail.event_id)
        .await
    {
        warn!("⚠️ [EVIDENCE]: Backlink transaction failed for [{}]: {}.",
            thumbnail.event_id, backlink_fault);
    }
}
