// [libs/infra/db-turso/src/repositories/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION REPOSITORY (V12.0 - LIFECYCLE HARDENED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: IDENTIDAD, CICLO DE VIDA Y RIESGO DE SESIONES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDEMPOTENT START: 'start' sobre una tupla ACTIVE retorna la fila
 *    intacta; la carrera de doble-start se resuelve con la restricción
 *    UNIQUE de la tupla como árbitro final.
 * 2. MONOTONE END: ACTIVE -> ENDED sin retorno; 'end' repetido es
 *    éxito no-op. El sweep de latidos caducos usa la misma transición.
 * 3. ATOMIC RISK: La actualización decadente del acumulador es UNA
 *    sentencia SQL con RETURNING; sin cerrojos gruesos en el hot path.
 * =================================================================
 */

use crate::chronology::{decode_instant, decode_optional_instant, encode_instant};
use crate::errors::{is_unique_violation, DbError};
use crate::TursoClient;
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use vigil_domain_models::session::{ExamIdentityTuple, ProctoringSession, SessionStatus};

/// Proyección canónica de columnas de sesión, en orden de mapeo.
const SESSION_PROJECTION: &str = "id, tenant_id, exam_schedule_id, user_id, attempt_no, \
     status, started_at, ended_at, last_heartbeat_at, current_risk_score, config_snapshot";

pub struct SessionRepository {
    database_client: TursoClient,
}

impl SessionRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Arranque idempotente de sesión sobre la tupla de identidad.
     *
     * # Errors:
     * - `SessionEnded` si la tupla ya posee una sesión clausurada
     *   (el ciclo de vida monótono prohíbe la resurrección).
     */
    #[instrument(skip(self, config_snapshot))]
    pub async fn start_session(
        &self,
        identity: &ExamIdentityTuple,
        config_snapshot: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<ProctoringSession, DbError> {
        if let Some(existing_session) = self.find_by_identity(identity).await? {
            return match existing_session.status {
                SessionStatus::Active => Ok(existing_session),
                SessionStatus::Ended => Err(DbError::SessionEnded),
            };
        }

        let fresh_session_id = Uuid::new_v4();
        let canonical_now = encode_instant(&now);
        let serialized_config = serde_json::to_string(config_snapshot)
            .map_err(|encode_fault| DbError::MappingError(encode_fault.to_string()))?;

        let connection = self.database_client.get_connection()?;
        let insertion_result = connection
            .execute(
                "INSERT INTO sessions (id, tenant_id, exam_schedule_id, user_id, attempt_no, \
                 status, started_at, last_heartbeat_at, current_risk_score, config_snapshot) \
                 VALUES (?1, ?2, ?3, ?4, ?5, 'ACTIVE', ?6, ?7, 0, ?8)",
                params![
                    fresh_session_id.to_string(),
                    identity.tenant_id.clone(),
                    identity.exam_schedule_id.clone(),
                    identity.user_id.clone(),
                    identity.attempt_no,
                    canonical_now.clone(),
                    canonical_now,
                    serialized_config
                ],
            )
            .await;

        match insertion_result {
            Ok(_) => {
                info!("🎬 [SESSION_REPO]: Session {} ignited for tenant [{}].",
                    fresh_session_id, identity.tenant_id);
                self.lookup(&fresh_session_id)
                    .await?
                    .ok_or(DbError::SessionNotFound)
            }
            // Carrera de doble-start: la restricción UNIQUE es el árbitro.
            Err(database_fault) if is_unique_violation(&database_fault) => {
                debug!("🔁 [SESSION_REPO]: Start race detected; yielding to winning row.");
                match self.find_by_identity(identity).await? {
                    Some(winner) if winner.status == SessionStatus::Active => Ok(winner),
                    Some(_) => Err(DbError::SessionEnded),
                    None => Err(DbError::SessionNotFound),
                }
            }
            Err(database_fault) => Err(DbError::QueryError(database_fault)),
        }
    }

    /// Resuelve la sesión por su llave opaca.
    pub async fn lookup(&self, session_id: &Uuid) -> Result<Option<ProctoringSession>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {SESSION_PROJECTION} FROM sessions WHERE id = ?1"),
                params![session_id.to_string()],
            )
            .await?;

        rows.next().await?.map(|row| map_session_row(&row)).transpose()
    }

    /// Resuelve la sesión por la tupla de identidad lógica (única).
    pub async fn find_by_identity(
        &self,
        identity: &ExamIdentityTuple,
    ) -> Result<Option<ProctoringSession>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {SESSION_PROJECTION} FROM sessions \
                     WHERE tenant_id = ?1 AND exam_schedule_id = ?2 \
                       AND user_id = ?3 AND attempt_no = ?4"
                ),
                params![
                    identity.tenant_id.clone(),
                    identity.exam_schedule_id.clone(),
                    identity.user_id.clone(),
                    identity.attempt_no
                ],
            )
            .await?;

        rows.next().await?.map(|row| map_session_row(&row)).transpose()
    }

    /**
     * Clausura monótona: ACTIVE -> ENDED. Repetir sobre ENDED es no-op.
     *
     * # Errors:
     * - `SessionNotFound` si la tupla jamás arrancó sesión.
     */
    #[instrument(skip(self))]
    pub async fn end_by_identity(
        &self,
        identity: &ExamIdentityTuple,
        now: DateTime<Utc>,
    ) -> Result<ProctoringSession, DbError> {
        let connection = self.database_client.get_connection()?;
        let sealed_rows = connection
            .execute(
                "UPDATE sessions SET status = 'ENDED', ended_at = ?1 \
                 WHERE tenant_id = ?2 AND exam_schedule_id = ?3 \
                   AND user_id = ?4 AND attempt_no = ?5 AND status = 'ACTIVE'",
                params![
                    encode_instant(&now),
                    identity.tenant_id.clone(),
                    identity.exam_schedule_id.clone(),
                    identity.user_id.clone(),
                    identity.attempt_no
                ],
            )
            .await?;

        if sealed_rows > 0 {
            info!("🏁 [SESSION_REPO]: Session sealed for tenant [{}].", identity.tenant_id);
        }

        self.find_by_identity(identity).await?.ok_or(DbError::SessionNotFound)
    }

    /**
     * Latido de vida: refresca 'last_heartbeat_at' solo en sesiones ACTIVE.
     *
     * # Errors:
     * - `SessionEnded` si la sesión ya fue clausurada.
     * - `SessionNotFound` si la tupla no posee sesión.
     */
    pub async fn heartbeat_by_identity(
        &self,
        identity: &ExamIdentityTuple,
        now: DateTime<Utc>,
    ) -> Result<ProctoringSession, DbError> {
        let connection = self.database_client.get_connection()?;
        let refreshed_rows = connection
            .execute(
                "UPDATE sessions SET last_heartbeat_at = ?1 \
                 WHERE tenant_id = ?2 AND exam_schedule_id = ?3 \
                   AND user_id = ?4 AND attempt_no = ?5 AND status = 'ACTIVE'",
                params![
                    encode_instant(&now),
                    identity.tenant_id.clone(),
                    identity.exam_schedule_id.clone(),
                    identity.user_id.clone(),
                    identity.attempt_no
                ],
            )
            .await?;

        let session = self
            .find_by_identity(identity)
            .await?
            .ok_or(DbError::SessionNotFound)?;

        if refreshed_rows == 0 {
            return Err(DbError::SessionEnded);
        }

        Ok(session)
    }

    /// Refresco de latido por llave opaca (invocado por la admisión de lotes).
    pub async fn touch_heartbeat(
        &self,
        session_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "UPDATE sessions SET last_heartbeat_at = ?1 WHERE id = ?2 AND status = 'ACTIVE'",
                params![encode_instant(&now), session_id.to_string()],
            )
            .await?;
        Ok(())
    }

    /**
     * Actualización atómica del acumulador de riesgo decadente:
     * score := max(0, score × decay + delta), en UNA sentencia SQL.
     *
     * # Errors:
     * - `SessionEnded` si la sesión ya no está ACTIVE.
     */
    #[instrument(skip(self), level = "debug")]
    pub async fn apply_risk_delta(
        &self,
        session_id: &Uuid,
        decay_factor: f64,
        delta: f64,
    ) -> Result<f64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "UPDATE sessions \
                 SET current_risk_score = MAX(0, current_risk_score * ?1 + ?2) \
                 WHERE id = ?3 AND status = 'ACTIVE' \
                 RETURNING current_risk_score",
                params![decay_factor, delta, session_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<f64>(0)?),
            None => Err(DbError::SessionEnded),
        }
    }

    /**
     * Barrido de higiene: clausura sesiones ACTIVE cuyo último latido
     * es anterior al umbral. Idempotente por construcción.
     */
    #[instrument(skip(self))]
    pub async fn sweep_stale(
        &self,
        stale_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let connection = self.database_client.get_connection()?;
        let sealed_count = connection
            .execute(
                "UPDATE sessions SET status = 'ENDED', ended_at = ?1 \
                 WHERE status = 'ACTIVE' AND last_heartbeat_at < ?2",
                params![encode_instant(&now), encode_instant(&stale_before)],
            )
            .await?;

        if sealed_count > 0 {
            warn!("💀 [SESSION_REPO]: Swept {} stale sessions into ENDED.", sealed_count);
        }

        Ok(sealed_count)
    }
}

/// Reconstruye la entidad de dominio desde la proyección canónica.
fn map_session_row(row: &Row) -> Result<ProctoringSession, DbError> {
    let session_id = Uuid::parse_str(&row.get::<String>(0)?)
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;

    let status_code = row.get::<String>(5)?;
    let status = SessionStatus::from_code(&status_code)
        .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_SESSION_STATUS [{status_code}]")))?;

    let config_snapshot = serde_json::from_str(&row.get::<String>(10)?)
        .map_err(|decode_fault| DbError::MappingError(decode_fault.to_string()))?;

    Ok(ProctoringSession {
        session_id,
        identity: ExamIdentityTuple {
            tenant_id: row.get::<String>(1)?,
            exam_schedule_id: row.get::<String>(2)?,
            user_id: row.get::<String>(3)?,
            attempt_no: row.get::<i64>(4)?,
        },
        status,
        started_at: decode_instant(&row.get::<String>(6)?)?,
        ended_at: decode_optional_instant(row.get::<Option<String>>(7)?)?,
        last_heartbeat_at: decode_instant(&row.get::<String>(8)?)?,
        current_risk_score: row.get::<f64>(9)?,
        config_snapshot,
    })
}
