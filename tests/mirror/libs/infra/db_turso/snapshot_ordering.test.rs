// [tests/mirror/libs/infra/db_turso/snapshot_ordering.test.rs]
/**
 * =================================================================
 * APARATO: SNAPSHOT ORDERING LEDGER TEST (V3.0 - STRICT CHRONOLOGY)
 * CLASIFICACIÓN: INFRASTRUCTURE EVIDENCE (ESTRATO L3)
 * RESPONSABILIDAD: ORDEN ESTRICTO POR SESIÓN DE LAS INSTANTÁNEAS
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use uuid::Uuid;
    use vigil_domain_models::snapshot::RiskScoreSnapshot;
    use vigil_infra_db::repositories::SnapshotRepository;
    use vigil_infra_db::TursoClient;

    /**
     * CERTIFICACIÓN: Las instantáneas se recuperan en orden estricto
     * de 'created_at' aunque se inserten desordenadas.
     */
    #[tokio::test]
    async fn certify_snapshots_strictly_ordered_per_session() {
        let client = TursoClient::connect("file:snapshot_order?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
        let repository = SnapshotRepository::new(client);

        let session_id = Uuid::new_v4();
        let base_instant = Utc::now();

        // Inserción deliberadamente desordenada (micro-offsets).
        for offset_microseconds in [250i64, 50, 900, 1] {
            repository
                .append(&RiskScoreSnapshot {
                    snapshot_id: Uuid::new_v4(),
                    session_id,
                    score: offset_microseconds as f64,
                    created_at: base_instant + ChronoDuration::microseconds(offset_microseconds),
                    details: json!({ "trigger": "cadence" }),
                })
                .await
                .unwrap();
        }

        // Otra sesión no contamina el orden de la primera.
        repository
            .append(&RiskScoreSnapshot {
                snapshot_id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                score: 0.0,
                created_at: base_instant,
                details: json!({}),
            })
            .await
            .unwrap();

        let snapshots = repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(snapshots.len(), 4);

        for adjacent_pair in snapshots.windows(2) {
            assert!(
                adjacent_pair[0].created_at < adjacent_pair[1].created_at,
                "snapshots must be strictly ordered by created_at"
            );
        }
    }
}
