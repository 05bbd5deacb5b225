// [libs/domain/models-rs/src/claims.rs]
/*!
 * =================================================================
 * APARATO: EXAM CLAIMS DOMAIN MODEL (V6.0 - GALVANIC IDENTITY)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE IDENTIDAD EXTRAÍDA DE LA CREDENCIAL
 *
 * # Logic:
 * Las claims viajan firmadas (RS256) por un emisor externo. El backend
 * solo las consume: cuatro claims de identidad + expiración. Un token
 * fresco con la misma tupla de identidad es transparente (refresh).
 * =================================================================
 */

use serde::{Deserialize, Serialize};

use crate::session::ExamIdentityTuple;

/// Claims requeridas de la credencial portadora de examen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamClaims {
    /// Tenant emisor de la convocatoria.
    pub tenant_id: String,
    /// Convocatoria de examen programada.
    pub exam_schedule_id: String,
    /// Examinado dentro del tenant.
    pub user_id: String,
    /// Número de intento (entero por contrato del emisor).
    pub attempt_no: i64,
    /// Expiración Unix (segundos). Validada por el verificador.
    pub exp: i64,
    /// Emisión Unix (segundos), si el emisor la estampa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl ExamClaims {
    /// Proyecta las cuatro claims de identidad como tupla soberana.
    pub fn identity_tuple(&self) -> ExamIdentityTuple {
        ExamIdentityTuple {
            tenant_id: self.tenant_id.clone(),
            exam_schedule_id: self.exam_schedule_id.clone(),
            user_id: self.user_id.clone(),
            attempt_no: self.attempt_no,
        }
    }
}
