// [tests/mirror/integration/summary_trust_test.rs]
/**
 * =================================================================
 * APARATO: SUMMARY & TRUST SCORE TEST (V6.0 - DASHBOARD EVIDENCE)
 * CLASIFICACIÓN: E2E INTEGRATION / TRINITY EVIDENCE
 * RESPONSABILIDAD: RESUMEN POST-SESIÓN, TRUST Y REPARACIÓN DE ENLACE
 *
 * # Logic:
 * 1. Un MULTI_PERSON con miniatura produce alerta + evidencia.
 * 2. El primer resumen repara el enlace alerta -> evidencia más
 *    próxima en el tiempo y lo persiste.
 * 3. trust = round(100 × mean(details.confidence)) y 100 sin alertas.
 * 4. La evidencia binaria baja por su endpoint con MIME real.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use base64::Engine;
    use chrono::Utc;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;
    use vigil_gateway::config::GatewayConfig;
    use vigil_gateway::routes::create_gateway_router;
    use vigil_gateway::state::AppState;
    use vigil_infra_credentials::CredentialKeySource;

    const SIGNING_PEM: &str = include_str!("../../fixtures/credential_signing_key.pem");
    const PUBLIC_PEM: &str = include_str!("../../fixtures/credential_public_key.pem");

    /// Miniatura JPEG sintética (cabecera SOI + relleno).
    const FAKE_JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

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

    async fn start_session(harness: &CertificationHarness) -> Uuid {
        let request = Request::builder()
            .method("POST")
            .uri("/proctoring/sessions/start")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from(json!({ "examConfig": { "cameraFps": 5 } }).to_string()))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        body_json["sessionId"].as_str().unwrap().parse().unwrap()
    }

    async fn fetch_summary(
        harness: &CertificationHarness,
        session_id: &Uuid,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/dashboard/sessions/{session_id}/summary"))
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::empty())
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap_or(json!({})))
    }

    /**
     * CERTIFICACIÓN: Resumen completo con trust score, conteos,
     * evidencia ordenada y reparación persistida del enlace.
     */
    #[tokio::test]
    async fn certify_summary_with_trust_and_evidence_repair() {
        let harness = setup_sovereign_test_environment("summary_full").await;
        let session_id = start_session(&harness).await;

        // MULTI_PERSON con miniatura: alerta CRITICAL + evidencia.
        let batch_request = Request::builder()
            .method("POST")
            .uri("/proctoring/events/batch")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from(
                json!({
                    "sessionId": session_id,
                    "events": [{
                        "eventId": "mp-1",
                        "type": "MULTI_PERSON",
                        "timestamp": Utc::now().to_rfc3339(),
                        "confidence": 0.95,
                        "details": { "faceCount": 2 }
                    }],
                    "thumbnails": [{
                        "eventId": "mp-1",
                        "contentType": "image/jpeg",
                        "dataBase64": BASE64_STANDARD.encode(FAKE_JPEG_BYTES),
                        "sizeBytes": FAKE_JPEG_BYTES.len()
                    }]
                })
                .to_string(),
            ))
            .unwrap();

        let batch_response = harness.router.clone().oneshot(batch_request).await.unwrap();
        assert_eq!(batch_response.status(), StatusCode::OK);

        // El evento quedó con evidencia enlazada (back-link transaccional).
        let events = harness.state.event_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(events.len(), 1);
        let linked_evidence_id = events[0].evidence_id.expect("thumbnail must back-link");

        let (summary_status, summary) = fetch_summary(&harness, &session_id).await;
        assert_eq!(summary_status, StatusCode::OK);

        // trust = round(100 × 0.95) = 95.
        assert_eq!(summary["trustScore"], 95);
        assert_eq!(summary["alertCountsByType"]["MULTI_PERSON"], 1);
        assert_eq!(summary["evidence"].as_array().unwrap().len(), 1);
        assert_eq!(
            summary["evidence"][0]["evidenceId"].as_str().unwrap(),
            linked_evidence_id.to_string()
        );

        // La reparación quedó PERSISTIDA: la alerta ahora referencia
        // la evidencia más próxima en el tiempo.
        let alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].evidence_id, Some(linked_evidence_id));
    }

    /**
     * CERTIFICACIÓN: Sin alertas con confianza, el trust proyecta 100.
     */
    #[tokio::test]
    async fn certify_empty_alert_set_projects_full_trust() {
        let harness = setup_sovereign_test_environment("summary_empty").await;
        let session_id = start_session(&harness).await;

        let (status, summary) = fetch_summary(&harness, &session_id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["trustScore"], 100);
        assert_eq!(summary["status"], "ACTIVE");
        assert!(summary["alertCountsByType"].as_object().unwrap().is_empty());
    }

    /**
     * CERTIFICACIÓN: Descarga binaria de evidencia con MIME real y
     * bytes bit-perfectos.
     */
    #[tokio::test]
    async fn certify_evidence_binary_download() {
        let harness = setup_sovereign_test_environment("summary_download").await;
        let session_id = start_session(&harness).await;

        let batch_request = Request::builder()
            .method("POST")
            .uri("/proctoring/events/batch")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from(
                json!({
                    "sessionId": session_id,
                    "events": [{
                        "eventId": "cam-1",
                        "type": "CAMERA_BLOCKED",
                        "timestamp": Utc::now().to_rfc3339(),
                        "confidence": 0.7,
                        "details": {}
                    }],
                    "thumbnails": [{
                        "eventId": "cam-1",
                        "contentType": "image/jpeg",
                        "dataBase64": BASE64_STANDARD.encode(FAKE_JPEG_BYTES),
                        "sizeBytes": FAKE_JPEG_BYTES.len()
                    }]
                })
                .to_string(),
            ))
            .unwrap();

        harness.router.clone().oneshot(batch_request).await.unwrap();

        let artifacts = harness.state.evidence_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(artifacts.len(), 1);
        let evidence_id = artifacts[0].evidence_id;

        let download_request = Request::builder()
            .method("GET")
            .uri(format!("/proctoring/evidence/{evidence_id}"))
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::empty())
            .unwrap();

        let response = harness.router.clone().oneshot(download_request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("image/jpeg")
        );

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body_bytes.as_ref(), FAKE_JPEG_BYTES);
    }
}
