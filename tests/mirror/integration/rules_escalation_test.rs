// [tests/mirror/integration/rules_escalation_test.rs]
/**
 * =================================================================
 * APARATO: RULES ESCALATION TEST (V7.0 - COGNITIVE EVIDENCE)
 * CLASIFICACIÓN: E2E INTEGRATION / TRINITY EVIDENCE
 * RESPONSABILIDAD: CERTIFICACIÓN DEL MOTOR DE REGLAS INLINE
 *
 * # Logic:
 * 1. MULTI_PERSON dispara una alerta CRITICAL inmediata.
 * 2. Tres FACE_MISSING en 5 minutos emiten UNA alerta HIGH; el cuarto
 *    cae en la misma época de cooldown y no re-emite.
 * 3. LOW_LIGHT es solo-registro incluso declarado CRITICAL.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{SecondsFormat, Utc};
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;
    use vigil_domain_models::event::{EventKind, SeverityLevel};
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

    async fn submit_event(
        harness: &CertificationHarness,
        session_id: &Uuid,
        event_payload: serde_json::Value,
    ) {
        let request = Request::builder()
            .method("POST")
            .uri("/proctoring/events/batch")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", harness.bearer_token))
            .body(Body::from(
                json!({ "sessionId": session_id, "events": [event_payload], "thumbnails": [] })
                    .to_string(),
            ))
            .unwrap();

        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn wire_now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /**
     * CERTIFICACIÓN: Alerta CRITICAL inmediata ante MULTI_PERSON.
     */
    #[tokio::test]
    async fn certify_multi_person_immediate_critical_alert() {
        let harness = setup_sovereign_test_environment("rules_multi").await;
        let session_id = start_session(&harness).await;

        submit_event(
            &harness,
            &session_id,
            json!({
                "eventId": "e2",
                "type": "MULTI_PERSON",
                "timestamp": wire_now(),
                "confidence": 0.95,
                "details": { "faceCount": 2 }
            }),
        )
        .await;

        let alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(alerts.len(), 1, "exactly one immediate alert expected");
        assert_eq!(alerts[0].kind, EventKind::MultiPerson);
        assert_eq!(alerts[0].severity, SeverityLevel::Critical);
        assert_eq!(alerts[0].triggering_event_id.as_deref(), Some("e2"));
    }

    /**
     * CERTIFICACIÓN: Escalación por ventana deslizante de FACE_MISSING.
     * El tercer evento emite UNA alerta HIGH; el cuarto queda bajo cooldown.
     */
    #[tokio::test]
    async fn certify_face_missing_window_escalation_with_cooldown() {
        let harness = setup_sovereign_test_environment("rules_face").await;
        let session_id = start_session(&harness).await;

        for occurrence in 1..=2 {
            submit_event(
                &harness,
                &session_id,
                json!({
                    "eventId": format!("fm-{occurrence}"),
                    "type": "FACE_MISSING",
                    "timestamp": wire_now(),
                    "confidence": 0.9,
                    "details": {}
                }),
            )
            .await;
        }

        // Dos ocurrencias: todavía bajo el umbral de 3.
        let early_alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert!(early_alerts.is_empty(), "threshold must not fire below 3");

        submit_event(
            &harness,
            &session_id,
            json!({
                "eventId": "fm-3",
                "type": "FACE_MISSING",
                "timestamp": wire_now(),
                "confidence": 0.9,
                "details": {}
            }),
        )
        .await;

        let fired_alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(fired_alerts.len(), 1, "third occurrence fires exactly one alert");
        assert_eq!(fired_alerts[0].kind, EventKind::FaceMissing);
        assert_eq!(fired_alerts[0].severity, SeverityLevel::High);

        // Cuarta ocurrencia dentro de la misma época de cooldown.
        submit_event(
            &harness,
            &session_id,
            json!({
                "eventId": "fm-4",
                "type": "FACE_MISSING",
                "timestamp": wire_now(),
                "confidence": 0.9,
                "details": {}
            }),
        )
        .await;

        let cooled_alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(cooled_alerts.len(), 1, "cooldown epoch must suppress re-emission");
    }

    /**
     * CERTIFICACIÓN: LOW_LIGHT es solo-registro (sin alerta) pero sí
     * alimenta el acumulador de riesgo.
     */
    #[tokio::test]
    async fn certify_low_light_is_record_only() {
        let harness = setup_sovereign_test_environment("rules_lowlight").await;
        let session_id = start_session(&harness).await;

        submit_event(
            &harness,
            &session_id,
            json!({
                "eventId": "ll-1",
                "type": "LOW_LIGHT",
                "timestamp": wire_now(),
                "severity": "CRITICAL",
                "details": {}
            }),
        )
        .await;

        let alerts = harness.state.alert_repository.list_by_session(&session_id).await.unwrap();
        assert!(alerts.is_empty(), "LOW_LIGHT never reaches the alert flow");

        let events = harness.state.event_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(events.len(), 1, "the event is stored for audit");

        let session = harness.state.session_repository.lookup(&session_id).await.unwrap().unwrap();
        assert!((session.current_risk_score - 2.0).abs() < 1e-9, "LOW_LIGHT base delta is 2");
    }

    /**
     * CERTIFICACIÓN: Tipos desconocidos se admiten sin regla y la
     * re-evaluación idempotente no double-cuenta la ventana.
     */
    #[tokio::test]
    async fn certify_unknown_kind_audit_and_idempotent_reevaluation() {
        let harness = setup_sovereign_test_environment("rules_unknown").await;
        let session_id = start_session(&harness).await;

        submit_event(
            &harness,
            &session_id,
            json!({
                "eventId": "ex-1",
                "type": "PHONE_GLARE",
                "timestamp": wire_now(),
                "confidence": 1.0,
                "details": {}
            }),
        )
        .await;

        let events = harness.state.event_repository.list_by_session(&session_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Unknown("PHONE_GLARE".to_string()));

        let session_after_first = harness.state.session_repository.lookup(&session_id).await.unwrap().unwrap();
        let score_after_first = session_after_first.current_risk_score;
        assert!((score_after_first - 1.0).abs() < 1e-9, "unknown kinds add the audit minimum");

        // Re-evaluación directa del mismo evento (ruta asíncrona simulada):
        // la ventana ya contiene ex-1, el motor debe ser no-op.
        harness.state.rules_engine.evaluate(&events[0]).await.unwrap();

        let session_after_replay = harness.state.session_repository.lookup(&session_id).await.unwrap().unwrap();
        assert!(
            (session_after_replay.current_risk_score - score_after_first).abs() < 1e-12,
            "idempotent re-evaluation must not mutate the score"
        );
    }
}
