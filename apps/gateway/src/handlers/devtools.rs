// [apps/gateway/src/handlers/devtools.rs]
/*!
 * =================================================================
 * APARATO: DEVELOPMENT CREDENTIAL HANDLER (V4.0 - QUARANTINED)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EMISIÓN DE TOKENS DE PRUEBA EN PERFILES DEV
 *
 * # Logic:
 * Esta ruta SOLO se monta cuando el perfil de despliegue es
 * local/docker Y hay llave de firma configurada. En producción el
 * enrutador jamás la registra.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{instrument, warn};
use vigil_domain_models::session::ExamIdentityTuple;

/// TTL por defecto de las credenciales de desarrollo (1 h).
const DEFAULT_DEVELOPMENT_TTL_SECONDS: u64 = 3_600;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialPayload {
    pub tenant_id: String,
    pub exam_schedule_id: String,
    pub user_id: String,
    pub attempt_no: i64,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

/**
 * Endpoint: POST /dev/credentials/issue (solo perfiles de desarrollo)
 */
#[instrument(skip(application_state, issuance_payload), fields(tenant = %issuance_payload.tenant_id))]
pub async fn handle_credential_issuance(
    State(application_state): State<AppState>,
    Json(issuance_payload): Json<IssueCredentialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(development_forge) = application_state.development_forge.as_ref() else {
        // Sin forja montada, la ruta no existe para el exterior.
        return Err(ApiError::NotFound);
    };

    let identity = ExamIdentityTuple {
        tenant_id: issuance_payload.tenant_id,
        exam_schedule_id: issuance_payload.exam_schedule_id,
        user_id: issuance_payload.user_id,
        attempt_no: issuance_payload.attempt_no,
    };

    let time_to_live = Duration::from_secs(
        issuance_payload.ttl_seconds.unwrap_or(DEFAULT_DEVELOPMENT_TTL_SECONDS),
    );

    let token = development_forge
        .issue(&identity, time_to_live, Utc::now())
        .map_err(|forge_fault| {
            warn!("⚠️ [DEV_FORGE]: Issuance failed: {}", forge_fault);
            ApiError::Internal(forge_fault.to_string())
        })?;

    Ok(Json(json!({ "token": token })))
}
