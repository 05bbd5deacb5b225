// [tests/mirror/integration/batch_admission_test.rs]
/**
 * =================================================================
 * APARATO: BATCH ADMISSION INTEGRITY TEST (V8.0 - SOBERANO)
 * CLASIFICACIÓN: E2E INTEGRATION / TRINITY EVIDENCE
 * RESPONSABILIDAD: CERTIFICACIÓN DEL PIPELINE DE ADMISIÓN
 *
 * # Logic:
 * Valida la cadena completa de admisión sobre el router real:
 * 1. HTTP Interface: start de sesión y lote aceptado en orden.
 * 2. Tactical Dedup: el replay del lote marca 'duplicate' y el Ledger
 *    conserva UNA fila por event_id.
 * 3. Skew Shield: la frontera exacta de 300 s admite; 301 s rechaza.
 * 4. Size Shield: el lote que excede los 64 KiB proyecta 413.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;
    use vigil_domain_models::batch::BatchVerdict;
    use vigil_gateway::routes::create_gateway_router;
    use vigil_gateway::state::AppState;
    use vigil_gateway::config::GatewayConfig;
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

    /// Configura un entorno de pruebas aislado con ambos Ledgers en RAM.
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
            .expect("dev forge must be active in certification profile")
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

    async fn start_session(harness: &CertificationHarness) -> Uuid {
        let request = Request::builder()
            .method("POST")
            .uri("/proctoring/sessions/start")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from("{}"))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        body_json["sessionId"].as_str().unwrap().parse().unwrap()
    }

    async fn dispatch_batch(
        harness: &CertificationHarness,
        batch_payload: serde_json::Value,
    ) -> (StatusCode, Option<BatchVerdict>) {
        let request = Request::builder()
            .method("POST")
            .uri("/proctoring/events/batch")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from(batch_payload.to_string()))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let verdict = serde_json::from_slice::<BatchVerdict>(&body_bytes).ok();
        (status, verdict)
    }

    fn wire_timestamp(offset_seconds: i64) -> String {
        (Utc::now() + ChronoDuration::seconds(offset_seconds))
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /**
     * CERTIFICACIÓN: Aceptación básica con score de riesgo ≈ 4.0.
     */
    #[tokio::test]
    async fn certify_basic_accept_and_risk_score() {
        let harness = setup_sovereign_test_environment("admission_basic").await;
        let session_id = start_session(&harness).await;

        let (status, verdict) = dispatch_batch(
            &harness,
            json!({
                "sessionId": session_id,
                "events": [{
                    "eventId": "e1",
                    "type": "LOOK_AWAY",
                    "timestamp": wire_timestamp(0),
                    "confidence": 0.8,
                    "severity": "MEDIUM",
                    "details": {}
                }],
                "thumbnails": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let verdict = verdict.expect("batch verdict body");
        assert_eq!(verdict.accepted_event_ids, vec!["e1".to_string()]);
        assert!(verdict.rejected_event_ids.is_empty());

        // Sin alerta: LOOK_AWAY aislado no alcanza umbral alguno.
        let alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert!(alerts.is_empty(), "a lone LOOK_AWAY must not alert");

        // Riesgo: 0 × 0.98 + 5 × 0.8 = 4.0.
        let session = harness.state.session_repository.lookup(&session_id).await.unwrap().unwrap();
        assert!((session.current_risk_score - 4.0).abs() < 1e-9,
            "risk score drifted: {}", session.current_risk_score);
    }

    /**
     * CERTIFICACIÓN: Supresión de duplicados end-to-end (replay del lote).
     */
    #[tokio::test]
    async fn certify_duplicate_suppression() {
        let harness = setup_sovereign_test_environment("admission_dup").await;
        let session_id = start_session(&harness).await;

        let batch_payload = json!({
            "sessionId": session_id,
            "events": [{
                "eventId": "e1",
                "type": "LOOK_AWAY",
                "timestamp": wire_timestamp(0),
                "confidence": 0.8,
                "severity": "MEDIUM",
                "details": {}
            }],
            "thumbnails": []
        });

        let (first_status, first_verdict) = dispatch_batch(&harness, batch_payload.clone()).await;
        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(first_verdict.unwrap().accepted_event_ids, vec!["e1".to_string()]);

        // Replay exacto del mismo lote.
        let (replay_status, replay_verdict) = dispatch_batch(&harness, batch_payload).await;
        assert_eq!(replay_status, StatusCode::OK);
        let replay_verdict = replay_verdict.unwrap();
        assert!(replay_verdict.accepted_event_ids.is_empty());
        assert_eq!(replay_verdict.rejected_event_ids, vec!["e1".to_string()]);
        assert_eq!(
            replay_verdict.reason_by_event_id.get("e1").map(|r| r.as_tag()),
            Some("duplicate")
        );

        // El Ledger conserva exactamente UNA fila para e1.
        let durable_rows = harness.state.event_repository.count_rows_for_event("e1").await.unwrap();
        assert_eq!(durable_rows, 1);
    }

    /**
     * CERTIFICACIÓN: Frontera exacta del sesgo temporal (300 s / 301 s).
     */
    #[tokio::test]
    async fn certify_timestamp_skew_boundary() {
        let harness = setup_sovereign_test_environment("admission_skew").await;
        let session_id = start_session(&harness).await;

        let (status, verdict) = dispatch_batch(
            &harness,
            json!({
                "sessionId": session_id,
                "events": [
                    {
                        "eventId": "on-boundary",
                        "type": "TAB_SWITCH",
                        "timestamp": wire_timestamp(-300),
                        "details": {}
                    },
                    {
                        "eventId": "past-boundary",
                        "type": "TAB_SWITCH",
                        "timestamp": wire_timestamp(-302),
                        "details": {}
                    }
                ],
                "thumbnails": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let verdict = verdict.unwrap();
        assert_eq!(verdict.accepted_event_ids, vec!["on-boundary".to_string()]);
        assert_eq!(verdict.rejected_event_ids, vec!["past-boundary".to_string()]);
        assert_eq!(
            verdict.reason_by_event_id.get("past-boundary").map(|r| r.as_tag()),
            Some("timestamp_out_of_range")
        );
    }

    /**
     * CERTIFICACIÓN: Descarte silencioso de event_id ausente.
     */
    #[tokio::test]
    async fn certify_blank_event_id_silent_skip() {
        let harness = setup_sovereign_test_environment("admission_blank").await;
        let session_id = start_session(&harness).await;

        let (status, verdict) = dispatch_batch(
            &harness,
            json!({
                "sessionId": session_id,
                "events": [
                    { "eventId": "", "type": "LOW_LIGHT", "timestamp": wire_timestamp(0), "details": {} },
                    { "eventId": "visible", "type": "LOW_LIGHT", "timestamp": wire_timestamp(0), "details": {} }
                ],
                "thumbnails": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let verdict = verdict.unwrap();
        assert_eq!(verdict.accepted_event_ids, vec!["visible".to_string()]);
        assert!(verdict.rejected_event_ids.is_empty(), "blank ids vanish silently");
    }

    /**
     * CERTIFICACIÓN: Guarda de 64 KiB del lote serializado (413).
     */
    #[tokio::test]
    async fn certify_batch_size_shield() {
        let harness = setup_sovereign_test_environment("admission_size").await;
        let session_id = start_session(&harness).await;

        let oversized_padding = "x".repeat(70_000);
        let (status, _) = dispatch_batch(
            &harness,
            json!({
                "sessionId": session_id,
                "events": [{
                    "eventId": "huge",
                    "type": "LOOK_AWAY",
                    "timestamp": wire_timestamp(0),
                    "details": { "padding": oversized_padding }
                }],
                "thumbnails": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    /**
     * CERTIFICACIÓN: Credencial ausente o malformada proyecta 401.
     */
    #[tokio::test]
    async fn certify_missing_credential_rejection() {
        let harness = setup_sovereign_test_environment("admission_auth").await;

        let request = Request::builder()
            .method("POST")
            .uri("/proctoring/sessions/start")
            .header("Content-Type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
