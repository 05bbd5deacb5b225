// [apps/gateway/src/handlers/review.rs]
/*!
 * =================================================================
 * APARATO: TENANT-SCOPED REVIEW HANDLER (V8.0 - EXISTENCE SHIELD)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA DE ALERTAS, EVENTOS Y EVIDENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EXISTENCE SHIELD: Todo recurso de otro tenant proyecta not_found
 *    (404), jamás forbidden — la existencia no se filtra.
 * 2. BINARY GATEWAY: La evidencia se sirve con su tipo MIME real desde
 *    la bóveda, sin exponer el localizador físico.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;
use vigil_domain_models::claims::ExamClaims;
use vigil_domain_models::session::ProctoringSession;

pub struct ReviewHandler;

impl ReviewHandler {
    /**
     * Endpoint: GET /proctoring/sessions/:session_id/alerts
     */
    #[instrument(skip(application_state, claims), fields(tenant = %claims.tenant_id))]
    pub async fn handle_list_alerts(
        State(application_state): State<AppState>,
        Extension(claims): Extension<ExamClaims>,
        Path(session_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, ApiError> {
        let session =
            resolve_tenant_scoped_session(&application_state, &claims, &session_id).await?;

        let alerts = application_state
            .alert_repository
            .list_by_session(&session.session_id)
            .await?;

        Ok(Json(json!({ "alerts": alerts })))
    }

    /**
     * Endpoint: GET /proctoring/sessions/:session_id/events
     */
    #[instrument(skip(application_state, claims), fields(tenant = %claims.tenant_id))]
    pub async fn handle_list_events(
        State(application_state): State<AppState>,
        Extension(claims): Extension<ExamClaims>,
        Path(session_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, ApiError> {
        let session =
            resolve_tenant_scoped_session(&application_state, &claims, &session_id).await?;

        let events = application_state
            .event_repository
            .list_by_session(&session.session_id)
            .await?;

        Ok(Json(json!({ "events": events })))
    }

    /**
     * Endpoint: GET /proctoring/evidence/:evidence_id
     *
     * Sirve los bytes binarios (JPEG) de una miniatura probatoria.
     */
    #[instrument(skip(application_state, claims), fields(tenant = %claims.tenant_id))]
    pub async fn handle_evidence_download(
        State(application_state): State<AppState>,
        Extension(claims): Extension<ExamClaims>,
        Path(evidence_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, ApiError> {
        let artifact = application_state
            .evidence_repository
            .fetch(&evidence_id)
            .await?
            .ok_or(ApiError::NotFound)?;

        // Escudo de tenant a través de la sesión propietaria.
        resolve_tenant_scoped_session(&application_state, &claims, &artifact.session_id).await?;

        let blob_bytes = application_state
            .evidence_vault
            .get(&artifact.storage_locator)
            .await
            .map_err(|vault_fault| ApiError::Internal(vault_fault.to_string()))?;

        Ok(([(header::CONTENT_TYPE, artifact.mime_type)], blob_bytes))
    }
}

/// Resuelve la sesión y aplica el escudo de existencia por tenant.
pub(crate) async fn resolve_tenant_scoped_session(
    application_state: &AppState,
    claims: &ExamClaims,
    session_id: &Uuid,
) -> Result<ProctoringSession, ApiError> {
    let session = application_state
        .session_repository
        .lookup(session_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if session.identity.tenant_id != claims.tenant_id {
        return Err(ApiError::NotFound);
    }

    Ok(session)
}
