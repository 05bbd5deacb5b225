// [apps/gateway/src/handlers/dashboard.rs]
/*!
 * APARATO: DASHBOARD SUMMARY HANDLER
 * RESPONSABILIDAD: Vista post-sesión determinista para operadores.
 */

use crate::errors::ApiError;
use crate::services::summary;
use crate::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use tracing::instrument;
use uuid::Uuid;
use vigil_domain_models::claims::ExamClaims;

/**
 * Endpoint: GET /dashboard/sessions/:session_id/summary
 */
#[instrument(skip(application_state, claims), fields(tenant = %claims.tenant_id))]
pub async fn handle_session_summary(
    State(application_state): State<AppState>,
    Extension(claims): Extension<ExamClaims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session_summary =
        summary::build_summary(&application_state, &session_id, &claims).await?;

    Ok(Json(session_summary))
}
