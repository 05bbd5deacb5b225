// [libs/infra/db-turso/src/repositories/snapshot.rs]
/*!
 * APARATO: RISK SNAPSHOT REPOSITORY
 * RESPONSABILIDAD: Persistencia append-only de instantáneas de riesgo.
 *
 * Las instantáneas jamás mutan; el orden estricto por sesión se apoya
 * en la proyección temporal canónica de ancho fijo (chronology).
 */

use crate::chronology::{decode_instant, encode_instant};
use crate::errors::DbError;
use crate::TursoClient;
use libsql::params;
use tracing::instrument;
use uuid::Uuid;
use vigil_domain_models::snapshot::RiskScoreSnapshot;

pub struct SnapshotRepository {
    database_client: TursoClient,
}

impl SnapshotRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /// Anexa una instantánea del acumulador (append-only).
    #[instrument(skip(self, snapshot), fields(session = %snapshot.session_id))]
    pub async fn append(&self, snapshot: &RiskScoreSnapshot) -> Result<(), DbError> {
        let serialized_details = serde_json::to_string(&snapshot.details)
            .map_err(|encode_fault| DbError::MappingError(encode_fault.to_string()))?;

        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO risk_snapshots (id, session_id, score, created_at, details) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    snapshot.snapshot_id.to_string(),
                    snapshot.session_id.to_string(),
                    snapshot.score,
                    encode_instant(&snapshot.created_at),
                    serialized_details
                ],
            )
            .await?;
        Ok(())
    }

    /// Instantáneas de una sesión en orden estricto de creación.
    pub async fn list_by_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<RiskScoreSnapshot>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, session_id, score, created_at, details FROM risk_snapshots \
                 WHERE session_id = ?1 ORDER BY created_at ASC",
                params![session_id.to_string()],
            )
            .await?;

        let mut snapshots = Vec::new();
        while let Some(row) = rows.next().await? {
            let snapshot_id = Uuid::parse_str(&row.get::<String>(0)?)
                .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;
            let owner_session_id = Uuid::parse_str(&row.get::<String>(1)?)
                .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;
            let details = serde_json::from_str(&row.get::<String>(4)?)
                .map_err(|decode_fault| DbError::MappingError(decode_fault.to_string()))?;

            snapshots.push(RiskScoreSnapshot {
                snapshot_id,
                session_id: owner_session_id,
                score: row.get::<f64>(2)?,
                created_at: decode_instant(&row.get::<String>(3)?)?,
                details,
            });
        }
        Ok(snapshots)
    }
}
