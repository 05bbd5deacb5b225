// [tests/mirror/libs/infra/db_turso/session_identity.test.rs]
/**
 * =================================================================
 * APARATO: SESSION IDENTITY LEDGER TEST (V5.0 - UNIQUENESS EVIDENCE)
 * CLASIFICACIÓN: INFRASTRUCTURE EVIDENCE (ESTRATO L3)
 * RESPONSABILIDAD: UNICIDAD DE TUPLA Y CICLO DE VIDA MONÓTONO
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use vigil_domain_models::session::{ExamIdentityTuple, SessionStatus};
    use vigil_infra_db::repositories::SessionRepository;
    use vigil_infra_db::{DbError, TursoClient};

    async fn ignite_ledger(isolation_label: &str) -> TursoClient {
        TursoClient::connect(
            &format!("file:{isolation_label}?mode=memory&cache=shared"),
            None,
        )
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.")
    }

    fn identity(attempt_no: i64) -> ExamIdentityTuple {
        ExamIdentityTuple {
            tenant_id: "T".into(),
            exam_schedule_id: "E".into(),
            user_id: "U".into(),
            attempt_no,
        }
    }

    /**
     * CERTIFICACIÓN: Exactamente una fila por tupla de identidad;
     * 'start' repetido retorna la misma sesión intacta.
     */
    #[tokio::test]
    async fn certify_one_row_per_identity_tuple() {
        let repository = SessionRepository::new(ignite_ledger("identity_unique").await);

        let first = repository
            .start_session(&identity(1), &json!({}), Utc::now())
            .await
            .unwrap();
        let second = repository
            .start_session(&identity(1), &json!({ "ignored": true }), Utc::now())
            .await
            .unwrap();

        assert_eq!(first.session_id, second.session_id, "idempotent start");
        assert_eq!(second.status, SessionStatus::Active);

        // Un intento distinto es otra tupla y otra sesión.
        let sibling_attempt = repository
            .start_session(&identity(2), &json!({}), Utc::now())
            .await
            .unwrap();
        assert_ne!(first.session_id, sibling_attempt.session_id);
    }

    /**
     * CERTIFICACIÓN: El ciclo ACTIVE -> ENDED es monótono; la tupla
     * clausurada no resucita vía 'start'.
     */
    #[tokio::test]
    async fn certify_monotone_lifecycle_without_resurrection() {
        let repository = SessionRepository::new(ignite_ledger("identity_monotone").await);

        let session = repository
            .start_session(&identity(1), &json!({}), Utc::now())
            .await
            .unwrap();

        let ended = repository.end_by_identity(&identity(1), Utc::now()).await.unwrap();
        assert_eq!(ended.status, SessionStatus::Ended);
        assert!(ended.ended_at.is_some(), "ended_at iff ENDED");
        assert_eq!(ended.session_id, session.session_id);

        // 'end' repetido es éxito no-op con la misma marca.
        let re_ended = repository.end_by_identity(&identity(1), Utc::now()).await.unwrap();
        assert_eq!(re_ended.status, SessionStatus::Ended);
        assert_eq!(re_ended.ended_at, ended.ended_at);

        // La tupla clausurada no admite un nuevo 'start'.
        assert!(matches!(
            repository.start_session(&identity(1), &json!({}), Utc::now()).await,
            Err(DbError::SessionEnded)
        ));

        // Latido tardío: fallo nominal.
        assert!(matches!(
            repository.heartbeat_by_identity(&identity(1), Utc::now()).await,
            Err(DbError::SessionEnded)
        ));
    }

    /**
     * CERTIFICACIÓN: El acumulador de riesgo aplica la actualización
     * decadente atómica y queda clavado en cero por abajo.
     */
    #[tokio::test]
    async fn certify_atomic_decaying_risk_update() {
        let repository = SessionRepository::new(ignite_ledger("identity_risk").await);

        let session = repository
            .start_session(&identity(1), &json!({}), Utc::now())
            .await
            .unwrap();

        let after_first = repository
            .apply_risk_delta(&session.session_id, 0.98, 50.0)
            .await
            .unwrap();
        assert!((after_first - 50.0).abs() < 1e-9);

        let after_second = repository
            .apply_risk_delta(&session.session_id, 0.98, 5.0)
            .await
            .unwrap();
        assert!((after_second - (50.0 * 0.98 + 5.0)).abs() < 1e-9);

        // Sobre sesión clausurada el acumulador ya no muta.
        repository.end_by_identity(&identity(1), Utc::now()).await.unwrap();
        assert!(matches!(
            repository.apply_risk_delta(&session.session_id, 0.98, 5.0).await,
            Err(DbError::SessionEnded)
        ));
    }

    /**
     * CERTIFICACIÓN: El barrido clausura solo latidos caducos.
     */
    #[tokio::test]
    async fn certify_sweep_targets_only_stale_heartbeats() {
        let repository = SessionRepository::new(ignite_ledger("identity_sweep").await);

        let stale = repository
            .start_session(&identity(1), &json!({}), Utc::now())
            .await
            .unwrap();
        let fresh = repository
            .start_session(&identity(2), &json!({}), Utc::now())
            .await
            .unwrap();

        // Refrescamos solo la segunda sesión hacia el futuro cercano.
        let refreshed_instant = Utc::now() + ChronoDuration::seconds(30);
        repository
            .touch_heartbeat(&fresh.session_id, refreshed_instant)
            .await
            .unwrap();

        let stale_before = Utc::now() + ChronoDuration::seconds(5);
        let sealed_count = repository.sweep_stale(stale_before, Utc::now()).await.unwrap();
        assert_eq!(sealed_count, 1, "only the unrefreshed session is sealed");

        let sealed = repository.lookup(&stale.session_id).await.unwrap().unwrap();
        assert_eq!(sealed.status, SessionStatus::Ended);

        let alive = repository.lookup(&fresh.session_id).await.unwrap().unwrap();
        assert_eq!(alive.status, SessionStatus::Active);
    }
}
