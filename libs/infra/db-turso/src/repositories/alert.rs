// [libs/infra/db-turso/src/repositories/alert.rs]
/*!
 * =================================================================
 * APARATO: OPERATOR ALERT REPOSITORY (V8.0 - PANOPTICON FEED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA Y REPARACIÓN DE ALERTAS DE OPERADOR
 * =================================================================
 */

use crate::chronology::{decode_instant, encode_instant};
use crate::errors::DbError;
use crate::TursoClient;
use libsql::{params, Row};
use tracing::{info, instrument};
use uuid::Uuid;
use vigil_domain_models::alert::OperatorAlert;
use vigil_domain_models::event::{EventKind, SeverityLevel};

/// Proyección canónica de columnas de alerta, en orden de mapeo.
const ALERT_PROJECTION: &str =
    "id, session_id, alert_type, severity, created_at, triggering_event_id, evidence_id, details";

pub struct AlertRepository {
    database_client: TursoClient,
}

impl AlertRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /// Persiste una alerta emitida por el motor de reglas.
    #[instrument(skip(self, alert), fields(alert_id = %alert.alert_id))]
    pub async fn insert_alert(&self, alert: &OperatorAlert) -> Result<(), DbError> {
        let serialized_details = serde_json::to_string(&alert.details)
            .map_err(|encode_fault| DbError::MappingError(encode_fault.to_string()))?;

        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO alerts \
                 (id, session_id, alert_type, severity, created_at, triggering_event_id, evidence_id, details) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    alert.alert_id.to_string(),
                    alert.session_id.to_string(),
                    alert.kind.as_code().to_string(),
                    alert.severity.as_code(),
                    encode_instant(&alert.created_at),
                    alert.triggering_event_id.clone(),
                    alert.evidence_id.map(|id| id.to_string()),
                    serialized_details
                ],
            )
            .await?;

        info!("🚨 [ALERT_REPO]: Alert {} [{}] persisted for session {}.",
            alert.alert_id, alert.kind, alert.session_id);
        Ok(())
    }

    /// Escaneo indexado de alertas por sesión, en orden de emisión.
    pub async fn list_by_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<OperatorAlert>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {ALERT_PROJECTION} FROM alerts \
                     WHERE session_id = ?1 ORDER BY created_at ASC"
                ),
                params![session_id.to_string()],
            )
            .await?;

        let mut alerts = Vec::new();
        while let Some(row) = rows.next().await? {
            alerts.push(map_alert_row(&row)?);
        }
        Ok(alerts)
    }

    /// Alertas sin evidencia enlazada (candidatas a reparación post-hoc).
    pub async fn list_unlinked(&self, session_id: &Uuid) -> Result<Vec<OperatorAlert>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {ALERT_PROJECTION} FROM alerts \
                     WHERE session_id = ?1 AND evidence_id IS NULL ORDER BY created_at ASC"
                ),
                params![session_id.to_string()],
            )
            .await?;

        let mut alerts = Vec::new();
        while let Some(row) = rows.next().await? {
            alerts.push(map_alert_row(&row)?);
        }
        Ok(alerts)
    }

    /// Reparación persistida: enlaza la evidencia más próxima en el tiempo.
    /// Solo procede si la alerta sigue sin evidencia (a lo sumo una vez).
    pub async fn bind_evidence(
        &self,
        alert_id: &Uuid,
        evidence_id: &Uuid,
    ) -> Result<bool, DbError> {
        let connection = self.database_client.get_connection()?;
        let repaired_rows = connection
            .execute(
                "UPDATE alerts SET evidence_id = ?1 WHERE id = ?2 AND evidence_id IS NULL",
                params![evidence_id.to_string(), alert_id.to_string()],
            )
            .await?;

        Ok(repaired_rows > 0)
    }
}

/// Reconstruye la entidad de dominio desde la proyección canónica.
fn map_alert_row(row: &Row) -> Result<OperatorAlert, DbError> {
    let alert_id = Uuid::parse_str(&row.get::<String>(0)?)
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;
    let session_id = Uuid::parse_str(&row.get::<String>(1)?)
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;

    let severity_code = row.get::<String>(3)?;
    let severity = SeverityLevel::from_code(&severity_code)
        .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_SEVERITY [{severity_code}]")))?;

    let evidence_id = row
        .get::<Option<String>>(6)?
        .map(|raw| Uuid::parse_str(&raw))
        .transpose()
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;

    let details = serde_json::from_str(&row.get::<String>(7)?)
        .map_err(|decode_fault| DbError::MappingError(decode_fault.to_string()))?;

    Ok(OperatorAlert {
        alert_id,
        session_id,
        kind: EventKind::from_code(&row.get::<String>(2)?),
        severity,
        created_at: decode_instant(&row.get::<String>(4)?)?,
        triggering_event_id: row.get::<Option<String>>(5)?,
        evidence_id,
        details,
    })
}
