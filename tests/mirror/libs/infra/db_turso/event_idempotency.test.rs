// [tests/mirror/libs/infra/db_turso/event_idempotency.test.rs]
/**
 * =================================================================
 * APARATO: EVENT IDEMPOTENCY LEDGER TEST (V4.0 - SECOND LINE)
 * CLASIFICACIÓN: INFRASTRUCTURE EVIDENCE (ESTRATO L3)
 * RESPONSABILIDAD: UNA FILA POR EVENT_ID Y ENLACE ÚNICO DE EVIDENCIA
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;
    use vigil_domain_models::event::{AnomalyEvent, EventKind, SeverityLevel};
    use vigil_domain_models::evidence::EvidenceArtifact;
    use vigil_infra_db::repositories::{EventRepository, EvidenceRepository};
    use vigil_infra_db::{DbError, TursoClient};

    async fn ignite_ledger(isolation_label: &str) -> TursoClient {
        TursoClient::connect(
            &format!("file:{isolation_label}?mode=memory&cache=shared"),
            None,
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.")
    }

    fn sample_event(event_id: &str, session_id: Uuid) -> AnomalyEvent {
        AnomalyEvent {
            event_id: event_id.to_string(),
            session_id,
            kind: EventKind::FaceMissing,
            event_time: Utc::now(),
            severity: SeverityLevel::Low,
            confidence: Some(0.9),
            details: json!({ "frame": 42 }),
            evidence_id: None,
            created_at: Utc::now(),
        }
    }

    fn sample_artifact(session_id: Uuid) -> EvidenceArtifact {
        EvidenceArtifact {
            evidence_id: Uuid::new_v4(),
            session_id,
            byte_size: 10,
            sha256_digest: "ab".repeat(32),
            mime_type: "image/jpeg".into(),
            created_at: Utc::now(),
            storage_locator: format!("{session_id}/thumb-e1.jpg"),
        }
    }

    /**
     * CERTIFICACIÓN: La PRIMARY KEY de event_id es la segunda línea de
     * defensa — la segunda inserción proyecta DuplicateEvent.
     */
    #[tokio::test]
    async fn certify_single_durable_row_per_event_id() {
        let client = ignite_ledger("event_dup").await;
        let repository = EventRepository::new(client);
        let session_id = Uuid::new_v4();

        repository.insert_event(&sample_event("e1", session_id)).await.unwrap();

        assert!(matches!(
            repository.insert_event(&sample_event("e1", session_id)).await,
            Err(DbError::DuplicateEvent)
        ));

        assert_eq!(repository.count_rows_for_event("e1").await.unwrap(), 1);

        let events = repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::FaceMissing);
        assert_eq!(events[0].details["frame"], 42);
    }

    /**
     * CERTIFICACIÓN: El par (INSERT evidence + back-link) es atómico y
     * el enlace ocurre a lo sumo una vez por evento.
     */
    #[tokio::test]
    async fn certify_evidence_backlink_is_transactional_and_unique() {
        let client = ignite_ledger("event_backlink").await;
        let event_repository = EventRepository::new(client.clone());
        let evidence_repository = EvidenceRepository::new(client);
        let session_id = Uuid::new_v4();

        event_repository.insert_event(&sample_event("e1", session_id)).await.unwrap();

        let first_artifact = sample_artifact(session_id);
        evidence_repository
            .store_with_backlink(&first_artifact, "e1")
            .await
            .unwrap();

        let events = event_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(events[0].evidence_id, Some(first_artifact.evidence_id));

        // Segundo intento sobre el mismo evento: transacción revertida.
        let second_artifact = sample_artifact(session_id);
        assert!(matches!(
            evidence_repository.store_with_backlink(&second_artifact, "e1").await,
            Err(DbError::EvidenceAlreadyLinked)
        ));

        // El rollback no dejó evidencia fantasma.
        assert!(evidence_repository
            .fetch(&second_artifact.evidence_id)
            .await
            .unwrap()
            .is_none());

        // Un evento inexistente tampoco acepta enlace.
        let orphan_artifact = sample_artifact(session_id);
        assert!(matches!(
            evidence_repository.store_with_backlink(&orphan_artifact, "ghost").await,
            Err(DbError::EvidenceAlreadyLinked)
        ));
    }
}
