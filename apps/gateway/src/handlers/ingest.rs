// [apps/gateway/src/handlers/ingest.rs]
/*!
 * =================================================================
 * APARATO: BATCH INGESTION HANDLER (V12.0 - HIGH FREQUENCY GATE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FRONTERA HTTP DEL PIPELINE DE ADMISIÓN
 *
 * # Logic:
 * El cuerpo se captura como bytes crudos: la guarda de 64 KiB opera
 * sobre la serialización exacta de red ANTES de deserializar. Los
 * fallos por-evento viajan dentro del veredicto (HTTP 200); solo los
 * fallos de lote completo proyectan códigos de estado.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::services::admission;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, State},
    response::IntoResponse,
    Json,
};
use tracing::instrument;
use vigil_domain_models::batch::BatchRequest;
use vigil_domain_models::claims::ExamClaims;

/**
 * Endpoint: POST /proctoring/events/batch
 */
#[instrument(skip(application_state, claims, raw_body), fields(tenant = %claims.tenant_id, bytes = raw_body.len()))]
pub async fn handle_batch_ingestion(
    State(application_state): State<AppState>,
    Extension(claims): Extension<ExamClaims>,
    raw_body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    // Guarda de tamaño sobre la serialización exacta (413).
    if raw_body.len() > application_state.config.max_batch_bytes {
        return Err(ApiError::BatchTooLarge);
    }

    let batch: BatchRequest =
        serde_json::from_slice(&raw_body).map_err(|_| ApiError::PayloadInvalid)?;

    let verdict =
        admission::admit_batch(&application_state, &claims, raw_body.len(), batch).await?;

    Ok(Json(verdict))
}
