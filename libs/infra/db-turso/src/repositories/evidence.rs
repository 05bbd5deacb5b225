// [libs/infra/db-turso/src/repositories/evidence.rs]
/*!
 * =================================================================
 * APARATO: EVIDENCE REPOSITORY (V7.0 - BACKLINK TRANSACTIONAL)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: METADATOS PROBATORIOS Y ENLACE UNO-A-UNO
 *
 * # Logic:
 * El ciclo evento <-> evidencia se rompe creando primero el evento y
 * después la evidencia: el par (INSERT evidence + UPDATE back-link)
 * es UNA transacción ACID. El back-link solo procede si el evento
 * existe y aún no posee evidencia (enlace a lo sumo una vez).
 * =================================================================
 */

use crate::chronology::{decode_instant, encode_instant};
use crate::errors::DbError;
use crate::TursoClient;
use libsql::{params, Row};
use tracing::{info, instrument};
use uuid::Uuid;
use vigil_domain_models::evidence::EvidenceArtifact;

/// Proyección canónica de columnas de evidencia, en orden de mapeo.
const EVIDENCE_PROJECTION: &str =
    "id, session_id, byte_size, sha256_digest, mime_type, created_at, storage_locator";

pub struct EvidenceRepository {
    database_client: TursoClient,
}

impl EvidenceRepository {
    pub fn new(client: TursoClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Persiste la evidencia y fija 'evidence_id' en su evento dueño,
     * ambos dentro de una transacción.
     *
     * # Errors:
     * - `EvidenceAlreadyLinked` si el evento no existe o ya tiene
     *   evidencia; la transacción completa se revierte.
     */
    #[instrument(skip(self, artifact), fields(evidence_id = %artifact.evidence_id))]
    pub async fn store_with_backlink(
        &self,
        artifact: &EvidenceArtifact,
        owning_event_id: &str,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let transaction = connection.transaction().await?;

        transaction
            .execute(
                "INSERT INTO evidence \
                 (id, session_id, byte_size, sha256_digest, mime_type, created_at, storage_locator) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    artifact.evidence_id.to_string(),
                    artifact.session_id.to_string(),
                    artifact.byte_size,
                    artifact.sha256_digest.clone(),
                    artifact.mime_type.clone(),
                    encode_instant(&artifact.created_at),
                    artifact.storage_locator.clone()
                ],
            )
            .await?;

        let backlinked_rows = transaction
            .execute(
                "UPDATE anomaly_events SET evidence_id = ?1 \
                 WHERE event_id = ?2 AND evidence_id IS NULL",
                params![artifact.evidence_id.to_string(), owning_event_id.to_string()],
            )
            .await?;

        if backlinked_rows == 0 {
            transaction.rollback().await?;
            return Err(DbError::EvidenceAlreadyLinked);
        }

        transaction.commit().await?;

        info!("📎 [EVIDENCE_REPO]: Artifact {} bound to event [{}].",
            artifact.evidence_id, owning_event_id);
        Ok(())
    }

    /// Resuelve la evidencia por su llave opaca.
    pub async fn fetch(&self, evidence_id: &Uuid) -> Result<Option<EvidenceArtifact>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!("SELECT {EVIDENCE_PROJECTION} FROM evidence WHERE id = ?1"),
                params![evidence_id.to_string()],
            )
            .await?;

        rows.next().await?.map(|row| map_evidence_row(&row)).transpose()
    }

    /// Lista ordenada de evidencia de una sesión (escaneo indexado).
    pub async fn list_by_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<EvidenceArtifact>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                &format!(
                    "SELECT {EVIDENCE_PROJECTION} FROM evidence \
                     WHERE session_id = ?1 ORDER BY created_at ASC"
                ),
                params![session_id.to_string()],
            )
            .await?;

        let mut artifacts = Vec::new();
        while let Some(row) = rows.next().await? {
            artifacts.push(map_evidence_row(&row)?);
        }
        Ok(artifacts)
    }
}

/// Reconstruye la entidad de dominio desde la proyección canónica.
fn map_evidence_row(row: &Row) -> Result<EvidenceArtifact, DbError> {
    let evidence_id = Uuid::parse_str(&row.get::<String>(0)?)
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;
    let session_id = Uuid::parse_str(&row.get::<String>(1)?)
        .map_err(|uuid_fault| DbError::MappingError(uuid_fault.to_string()))?;

    Ok(EvidenceArtifact {
        evidence_id,
        session_id,
        byte_size: row.get::<i64>(2)?,
        sha256_digest: row.get::<String>(3)?,
        mime_type: row.get::<String>(4)?,
        created_at: decode_instant(&row.get::<String>(5)?)?,
        storage_locator: row.get::<String>(6)?,
    })
}
