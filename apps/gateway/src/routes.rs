// [apps/gateway/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V13.0 - NORMATIVE TOPOLOGY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA DE RED, DEADLINES Y ESCUDOS PERIMETRALES
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología separa tres estratos con deadlines propios:
 * 1. INGESTA (High Frequency): ciclo de vida + lotes, deadline 5 s y
 *    límite de cuerpo de 64 KiB en la ruta de lotes.
 * 2. LECTURA (Operator Review): alertas/eventos/evidencia/resumen,
 *    deadline 2 s.
 * 3. DESARROLLO: forja de credenciales, montada SOLO en perfiles dev.
 * =================================================================
 */

use crate::handlers::{dashboard, devtools, ingest, review::ReviewHandler, sessions::SessionLifecycleHandler};
use crate::middleware::credential_guard;
use crate::state::AppState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

pub fn create_gateway_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS para el panel de operadores y herramientas Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let ingest_deadline_shield = TimeoutLayer::new(application_shared_state.config.ingest_deadline);
    let read_deadline_shield = TimeoutLayer::new(application_shared_state.config.read_deadline);

    // La guarda física del transporte admite el lote exacto de 64 KiB;
    // la guarda semántica (batch_too_large) vive en la admisión.
    let batch_transport_limit =
        RequestBodyLimitLayer::new(application_shared_state.config.max_batch_bytes * 2);

    // ESTRATO DE INGESTA: Ciclo de vida y lotes (High Frequency).
    let ingestion_stratum = Router::new()
        .route("/sessions/start", post(SessionLifecycleHandler::handle_session_start))
        .route("/sessions/end", post(SessionLifecycleHandler::handle_session_end))
        .route("/sessions/heartbeat", post(SessionLifecycleHandler::handle_session_heartbeat))
        .route(
            "/events/batch",
            post(ingest::handle_batch_ingestion).layer(batch_transport_limit),
        )
        .layer(ingest_deadline_shield);

    // ESTRATO DE LECTURA: Revisión tenant-scoped del operador.
    let review_stratum = Router::new()
        .route("/sessions/:session_id/alerts", get(ReviewHandler::handle_list_alerts))
        .route("/sessions/:session_id/events", get(ReviewHandler::handle_list_events))
        .route("/evidence/:evidence_id", get(ReviewHandler::handle_evidence_download))
        .layer(read_deadline_shield.clone());

    // ESTRATO DE DASHBOARD: Resumen post-sesión.
    let dashboard_stratum = Router::new()
        .route("/sessions/:session_id/summary", get(dashboard::handle_session_summary))
        .layer(read_deadline_shield);

    // COMPOSICIÓN GLOBAL (Root Topology).
    let mut sovereign_router = Router::new()
        .route("/health", get(|| async { "STATUS_OK" }))
        .nest(
            "/proctoring",
            ingestion_stratum
                .merge(review_stratum)
                .layer(middleware::from_fn_with_state(
                    application_shared_state.clone(),
                    credential_guard,
                )),
        )
        .nest(
            "/dashboard",
            dashboard_stratum.layer(middleware::from_fn_with_state(
                application_shared_state.clone(),
                credential_guard,
            )),
        );

    // ESTRATO DE DESARROLLO: la forja solo existe en perfiles dev.
    if application_shared_state.development_forge.is_some() {
        info!("🧪 [ROUTES]: Development credential issuance route mounted.");
        sovereign_router = sovereign_router
            .route("/dev/credentials/issue", post(devtools::handle_credential_issuance));
    }

    sovereign_router
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
