// [libs/infra/db-turso/src/repositories/event.rs]
/*!
 * =================================================================
 * APARATO: ANOMALY EVENT REPOSITORY (V10.1 - IDEMPOTENT WRITER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DURABLE DE EVENTOS (UNA FILA POR ID)
 *
 * # Logic:
 * La inserción por evento es UNA transacción implícita. La restricción
 * PRIMARY KEY sobre event_id es la segunda línea de defensa tras el
 * replay marker efímero: la violación se proyecta como DuplicateEvent.
 * =================================================================
 */

use crate::chronology::{decode_instant, encode_instant};
use crate::errors::{is_unique_violation, DbError};
use crate::TursoClient;
use libsql::{params, Row};
use tracing::instrument;
use uuid::Uuid;
use vigil_domain_models::event::{AnomalyEvent, EventKind, SeverityLevel};

/// Proyección canónica de columnas de evento, en orden de mapeo.
const EVENT_PROJECTION: &str =
    "event_id, session_id, event_type, event_time, severity, confidence, details, evidence_id, created_at";

pub struct EventRepository {
    database_client: TursoClient,
}

impl EventRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Inserta la fila durable del evento admitido.
     *
     * # Errors:
     * - `DuplicateEvent` si el event_id ya posee fila (defensa secundaria).
     */
    #[instrument(skip(self, event), fields(event_id = %event.event_id))]
    pub async fn insert_event(&self, event: &AnomalyEvent) -> Result<(), DbError> {
        let serialized_details = serde_json::to_string(&event.details)
            .map_err(|encode_fault| DbError::MappingError(encode_fault.to_string()))?;

        let connection = self.database_client.get_connection()?;
        let insertion_result = connection
            .execute(
                "INSERT INTO anomaly_events \
                 (event_id, session_id, event_type, event_time, severity, confidence, details, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    event.event_id.clone(),
                    event.session_id.to_string(),
                    event.kind.as_code().to_string(),
                    encode_instant(&event.event_time),
                    event.severity.as_code(),
                    event.confidence,
                    serialized_details,
                    encode_instant(&event.created_at)
                ],
            )
            .await;

        match insertion_result {
            Ok(_) => Ok(()),
            Err(database_fault) if is_unique_violation(&database_fault) => {
                Err(DbError::DuplicateEvent)
            }
            Err(database_fault) => Err(DbError::QueryError(database_fault)),
        }
    }

    /// Escaneo indexado de eventos por sesión, en orden de escritura durable.
    pub async fn list_by_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<AnomalyEvent>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {EVENT_PROJECTION} FROM anomaly_events \
                     WHERE session_id = ?1 ORDER BY created_at ASC"
                ),
                params![session_id.to_string()],
            )
            .await?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(map_event_row(&row)?);
        }
        Ok(events)
    }

    /// Conteo de filas durables para un event_id (certificaciones de idempotencia).
    pub async fn count_rows_for_event(&self, event_id: &str) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM anomaly_events WHERE event_id = ?1",
                params![event_id.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }
}

/// Reconstruye la entidad de dominio desde la proyección canónica.
pub(crate) fn map_event_row(row: &Row) -> Result<AnomalyEvent, DbError> {
    let session_id = Uuid::parse_str(&row.get::<String>(1)?)
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;

    let severity_code = row.get::<String>(4)?;
    let severity = SeverityLevel::from_code(&severity_code)
        .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_SEVERITY [{severity_code}]")))?;

    let details = serde_json::from_str(&row.get::<String>(6)?)
        .map_err(|decode_fault| DbError::MappingError(decode_fault.to_string()))?;

    let evidence_id = row
        .get::<Option<String>>(7)?
        .map(|raw| Uuid::parse_str(&raw))
        .transpose()
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;

    Ok(AnomalyEvent {
        event_id: row.get::<String>(0)?,
        session_id,
        kind: EventKind::from_code(&row.get::<String>(2)?),
        event_time: decode_instant(&row.get::<String>(3)?)?,
        severity,
        confidence: row.get::<Option<f64>>(5)?,
        details,
        evidence_id,
        created_at: decode_instant(&row.get::<String>(8)?)?,
    })
}
