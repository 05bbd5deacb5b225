// [apps/gateway/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: GALVANIC CREDENTIAL GUARD (V9.0 - RS256 ENFORCED)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: VERIFICACIÓN DE TOKEN E INYECCIÓN DE IDENTIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. REAL SIGNATURE CHECK: La firma RS256 se verifica contra el
 *    material de llave del emisor en CADA petición; nada de decodificar
 *    el payload sin verificar.
 * 2. EXTENSION INJECTION: Inyecta 'ExamClaims' en el flujo asíncrono de
 *    la petición para consumo de los estratos de admisión y lectura.
 * 3. TRANSPARENT REFRESH: Un token fresco con la misma tupla de
 *    identidad atraviesa el guardia sin estado adicional.
 * =================================================================
 */

use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/**
 * Guardia de Credenciales: el portero soberano de todo endpoint
 * de proctoring y dashboard.
 */
pub async fn credential_guard(
    State(application_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header_value| header_value.to_str().ok());

    let bearer_token = match authorization_header {
        Some(header_content) if header_content.starts_with("Bearer ") => &header_content[7..],
        _ => {
            warn!("❌ [AUTH_REJECTION]: Bearer credential absent.");
            return Err(ApiError::CredentialInvalid);
        }
    };

    match application_state.credential_verifier.verify(bearer_token) {
        Ok(verified_claims) => {
            debug!("👤 [AUTH]: Tenant [{}] user [{}] authenticated.",
                verified_claims.tenant_id, verified_claims.user_id);
            request.extensions_mut().insert(verified_claims);
            Ok(next.run(request).await)
        }
        Err(verification_fault) => {
            warn!("❌ [AUTH_REJECTION]: {}", verification_fault);
            Err(ApiError::CredentialInvalid)
        }
    }
}
