// [apps/gateway/src/handlers/sessions.rs]
/*!
 * =================================================================
 * APARATO: SESSION LIFECYCLE HANDLER (V10.0 - SWISS PRECISION)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: START IDEMPOTENTE, END MONÓTONO Y HEARTBEAT
 *
 * # Logic:
 * La identidad de sesión proviene EXCLUSIVAMENTE de las claims
 * verificadas; el cuerpo solo transporta la configuración opaca del
 * examen capturada en el arranque.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Extension, Json, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use vigil_domain_models::claims::ExamClaims;

/// Cuerpo opcional del arranque: configuración opaca del examen.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionPayload {
    #[serde(default)]
    pub exam_config: Option<serde_json::Map<String, serde_json::Value>>,
}

pub struct SessionLifecycleHandler;

impl SessionLifecycleHandler {
    /**
     * Endpoint: POST /proctoring/sessions/start
     *
     * Idempotente sobre la tupla de identidad: una sesión ACTIVE
     * existente se retorna intacta (mismo sessionId).
     */
    #[instrument(skip(application_state, claims, start_payload), fields(tenant = %claims.tenant_id))]
    pub async fn handle_session_start(
        State(application_state): State<AppState>,
        Extension(claims): Extension<ExamClaims>,
        start_payload: Option<Json<StartSessionPayload>>,
    ) -> Result<impl IntoResponse, ApiError> {
        let config_snapshot = start_payload
            .and_then(|Json(payload)| payload.exam_config)
            .map(serde_json::Value::Object)
            .unwrap_or_else(|| json!({}));

        let session = application_state
            .session_repository
            .start_session(&claims.identity_tuple(), &config_snapshot, Utc::now())
            .await?;

        Ok(Json(json!({
            "sessionId": session.session_id,
            "status": session.status.as_code(),
        })))
    }

    /**
     * Endpoint: POST /proctoring/sessions/end
     *
     * Transición monótona ACTIVE -> ENDED; repetir es éxito no-op.
     */
    #[instrument(skip(application_state, claims), fields(tenant = %claims.tenant_id))]
    pub async fn handle_session_end(
        State(application_state): State<AppState>,
        Extension(claims): Extension<ExamClaims>,
    ) -> Result<impl IntoResponse, ApiError> {
        let session = application_state
            .session_repository
            .end_by_identity(&claims.identity_tuple(), Utc::now())
            .await?;

        Ok(Json(json!({
            "sessionId": session.session_id,
            "status": session.status.as_code(),
        })))
    }

    /**
     * Endpoint: POST /proctoring/sessions/heartbeat
     *
     * Refresca el latido solo en sesiones ACTIVE; sobre ENDED proyecta
     * el fallo nominal 'session_ended'.
     */
    #[instrument(skip(application_state, claims), fields(tenant = %claims.tenant_id))]
    pub async fn handle_session_heartbeat(
        State(application_state): State<AppState>,
        Extension(claims): Extension<ExamClaims>,
    ) -> Result<impl IntoResponse, ApiError> {
        let session = application_state
            .session_repository
            .heartbeat_by_identity(&claims.identity_tuple(), Utc::now())
            .await?;

        Ok(Json(json!({
            "sessionId": session.session_id,
            "lastHeartbeat": session.last_heartbeat_at,
        })))
    }
}
