// [tests/mirror/integration/session_lifecycle_test.rs]
/**
 * =================================================================
 * APARATO: SESSION LIFECYCLE TEST (V6.0 - MONOTONE EVIDENCE)
 * CLASIFICACIÓN: E2E INTEGRATION / TRINITY EVIDENCE
 * RESPONSABILIDAD: START IDEMPOTENTE, END MONÓTONO Y SWEEP
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;
    use vigil_gateway::config::GatewayConfig;
    use vigil_gateway::routes::create_gateway_router;
    use vigil_gateway::state::AppState;
    use vigil_infra_credentials::CredentialKeySource;

    const SIGNING_PEM: &str = include_str!("../../fixtures/credential_signing_key.pem");
    const PUBLIC_PEM: &str = include_str!("../../fixtures/credential_public_key.pem");

    struct CertificationHarness {
        state: AppState,
        router: axum::Router,
        bearer_token: String,
        _vault_directory: tempfile::TempDir,
        _key_directory: tempfile::TempDir,
    }

    fn materialize_pem(directory: &tempfile::TempDir, file_name: &str, pem: &str) -> PathBuf {
        let pem_path = directory.path().join(file_name);
        let mut pem_file = std::fs::File::create(&pem_path).expect("pem file");
        pem_file.write_all(pem.as_bytes()).expect("pem write");
        pem_path
    }

    async fn setup_sovereign_test_environment(isolation_label: &str) -> CertificationHarness {
        let key_directory = tempfile::tempdir().expect("key tempdir");
        let vault_directory = tempfile::tempdir().expect("vault tempdir");

        let public_key_path = materialize_pem(&key_directory, "public.pem", PUBLIC_PEM);
        let signing_key_path = materialize_pem(&key_directory, "signer.pem", SIGNING_PEM);

        let config = GatewayConfig::for_certification(
            format!("file:{isolation_label}_ledger?mode=memory&cache=shared"),
            format!("file:{isolation_label}_cache?mode=memory&cache=shared"),
            vault_directory.path(),
            CredentialKeySource::StaticPem(public_key_path),
            Some(signing_key_path),
        );

        let state = AppState::ignite(config)
            .await
            .expect("CRITICAL_FAULT: Failed to anchor in-memory strata.");

        let bearer_token = state
            .development_forge
            .as_ref()
            .expect("dev forge active")
            .issue(
                &vigil_domain_models::session::ExamIdentityTuple {
                    tenant_id: "T".into(),
                    exam_schedule_id: "E".into(),
                    user_id: "U".into(),
                    attempt_no: 1,
                },
                Duration::from_secs(3600),
                Utc::now(),
            )
            .expect("token issuance");

        let router = create_gateway_router(state.clone());

        CertificationHarness {
            state,
            router,
            bearer_token,
            _vault_directory: vault_directory,
            _key_directory: key_directory,
        }
    }

    async fn lifecycle_call(
        harness: &CertificationHarness,
        path: &str,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from("{}"))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
        (status, body_json)
    }

    /**
     * CERTIFICACIÓN: 'start' es idempotente sobre la tupla de identidad.
     */
    #[tokio::test]
    async fn certify_idempotent_start_returns_same_session() {
        let harness = setup_sovereign_test_environment("lifecycle_idem").await;

        let (first_status, first_body) = lifecycle_call(&harness, "/proctoring/sessions/start").await;
        let (second_status, second_body) = lifecycle_call(&harness, "/proctoring/sessions/start").await;

        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first_body["sessionId"], second_body["sessionId"], "same tuple, same session");
        assert_eq!(second_body["status"], "ACTIVE");
    }

    /**
     * CERTIFICACIÓN: 'end' es monótono y repetible; 'heartbeat' sobre
     * ENDED proyecta el fallo nominal.
     */
    #[tokio::test]
    async fn certify_monotone_end_and_heartbeat_rejection() {
        let harness = setup_sovereign_test_environment("lifecycle_end").await;

        let (_, start_body) = lifecycle_call(&harness, "/proctoring/sessions/start").await;

        // Latido sobre sesión viva: refresca y retorna la marca.
        let (heartbeat_status, heartbeat_body) =
            lifecycle_call(&harness, "/proctoring/sessions/heartbeat").await;
        assert_eq!(heartbeat_status, StatusCode::OK);
        assert_eq!(heartbeat_body["sessionId"], start_body["sessionId"]);
        assert!(heartbeat_body["lastHeartbeat"].is_string());

        // Clausura monótona.
        let (end_status, end_body) = lifecycle_call(&harness, "/proctoring/sessions/end").await;
        assert_eq!(end_status, StatusCode::OK);
        assert_eq!(end_body["status"], "ENDED");

        // Repetir 'end' es éxito no-op.
        let (reend_status, reend_body) = lifecycle_call(&harness, "/proctoring/sessions/end").await;
        assert_eq!(reend_status, StatusCode::OK);
        assert_eq!(reend_body["status"], "ENDED");
        assert_eq!(reend_body["sessionId"], end_body["sessionId"]);

        // Latido tardío: fallo nominal 'session_ended'.
        let (stale_heartbeat_status, stale_heartbeat_body) =
            lifecycle_call(&harness, "/proctoring/sessions/heartbeat").await;
        assert_eq!(stale_heartbeat_status, StatusCode::BAD_REQUEST);
        assert_eq!(stale_heartbeat_body["error"], "session_ended");
    }

    /**
     * CERTIFICACIÓN: Escritura tardía de lote sobre sesión clausurada.
     */
    #[tokio::test]
    async fn certify_late_batch_rejected_after_end() {
        let harness = setup_sovereign_test_environment("lifecycle_late").await;

        let (_, start_body) = lifecycle_call(&harness, "/proctoring/sessions/start").await;
        lifecycle_call(&harness, "/proctoring/sessions/end").await;

        let request = Request::builder()
            .method("POST")
            .uri("/proctoring/events/batch")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from(
                json!({
                    "sessionId": start_body["sessionId"],
                    "events": [{
                        "eventId": "late-1",
                        "type": "LOOK_AWAY",
                        "timestamp": Utc::now().to_rfc3339(),
                        "details": {}
                    }],
                    "thumbnails": []
                })
                .to_string(),
            ))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body_json["error"], "session_ended");
    }

    /**
     * CERTIFICACIÓN: El barrido clausura sesiones con latido caduco y
     * es idempotente.
     */
    #[tokio::test]
    async fn certify_stale_heartbeat_sweep_is_idempotent() {
        let harness = setup_sovereign_test_environment("lifecycle_sweep").await;

        let (_, start_body) = lifecycle_call(&harness, "/proctoring/sessions/start").await;
        let session_id: uuid::Uuid = start_body["sessionId"].as_str().unwrap().parse().unwrap();

        // Umbral en el futuro: el latido recién estampado ya es "caduco".
        let synthetic_threshold = Utc::now() + ChronoDuration::seconds(5);
        let sealed_first = harness
            .state
            .session_repository
            .sweep_stale(synthetic_threshold, Utc::now())
            .await
            .unwrap();
        assert_eq!(sealed_first, 1);

        let session = harness.state.session_repository.lookup(&session_id).await.unwrap().unwrap();
        assert_eq!(session.status.as_code(), "ENDED");
        assert!(session.ended_at.is_some(), "ended_at stamped by the sweep");

        // Segundo barrido: nada que clausurar.
        let sealed_again = harness
            .state
            .session_repository
            .sweep_stale(synthetic_threshold, Utc::now())
            .await
            .unwrap();
        assert_eq!(sealed_again, 0, "sweep must be idempotent");
    }
}
