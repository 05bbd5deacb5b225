// [apps/gateway/src/errors.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY ERROR PROJECTION (V7.0 - STABLE TAG SET)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PROYECCIÓN HTTP DEL CATÁLOGO SEMÁNTICO DE FALLOS
 *
 * # Logic:
 * Los fallos por-evento viajan en el cuerpo del veredicto del lote;
 * este catálogo cubre los fallos de petición completa. Cada variante
 * proyecta una etiqueta estable y su código HTTP normativo:
 *   credential_invalid -> 401, not_found / session_not_found -> 404,
 *   batch_too_large -> 413, rate_limited -> 429, validación -> 400,
 *   colapso interno -> 500.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use vigil_infra_db::DbError;

#[derive(Debug)]
pub enum ApiError {
    /// Firma inválida, token malformado, expirado o claims incompletas.
    CredentialInvalid,
    /// La tupla de identidad de la credencial no coincide con la sesión.
    IdentityMismatch,
    /// La sesión declarada no existe.
    SessionNotFound,
    /// La sesión fue clausurada; la operación llega tarde.
    SessionEnded,
    /// El lote serializado excede el máximo configurado.
    BatchTooLarge,
    /// Cupo de ráfaga agotado antes de procesar el lote (ruta whole-batch).
    RateLimited,
    /// El cuerpo de la petición no deserializa al contrato normativo.
    PayloadInvalid,
    /// Recurso inexistente o de otro tenant (ocultación de existencia).
    NotFound,
    /// Colapso de almacén o de infraestructura.
    Internal(String),
}

impl ApiError {
    /// Etiqueta estable del catálogo, expuesta al cliente.
    pub fn as_tag(&self) -> &'static str {
        match self {
            ApiError::CredentialInvalid => "credential_invalid",
            ApiError::IdentityMismatch => "identity_mismatch",
            ApiError::SessionNotFound => "session_not_found",
            ApiError::SessionEnded => "session_ended",
            ApiError::BatchTooLarge => "batch_too_large",
            ApiError::RateLimited => "rate_limited",
            ApiError::PayloadInvalid => "payload_invalid",
            ApiError::NotFound => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::CredentialInvalid => StatusCode::UNAUTHORIZED,
            ApiError::IdentityMismatch => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::SessionEnded => StatusCode::BAD_REQUEST,
            ApiError::BatchTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PayloadInvalid => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(collapse_detail) = &self {
            error!("💀 [API_COLLAPSE]: {}", collapse_detail);
        }

        (
            self.status_code(),
            Json(json!({ "error": self.as_tag() })),
        )
            .into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(database_fault: DbError) -> Self {
        match database_fault {
            DbError::SessionNotFound => ApiError::SessionNotFound,
            DbError::SessionEnded => ApiError::SessionEnded,
            other_fault => ApiError::Internal(other_fault.to_string()),
        }
    }
}

impl From<vigil_infra_ephemeral::CacheError> for ApiError {
    fn from(cache_fault: vigil_infra_ephemeral::CacheError) -> Self {
        ApiError::Internal(cache_fault.to_string())
    }
}
