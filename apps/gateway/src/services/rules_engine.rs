// [apps/gateway/src/services/rules_engine.rs]
/*!
 * =================================================================
 * APARATO: SLIDING WINDOW RULES ENGINE (V11.0 - DUAL PATH IDEMPOTENT)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: VENTANAS, ALERTAS, RIESGO DECADENTE Y SNAPSHOTS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE EVALUATION CONTRACT: El hook inline de la admisión y la
 *    flota asíncrona invocan ESTA misma función; el primer camino en
 *    insertar el event_id en la ventana gana y el otro es no-op.
 * 2. COOLDOWN GATE: Una condición sostenida emite exactamente una
 *    alerta por época de cooldown por (sesión, tipo).
 * 3. CONSTANT-TIME HOOK: Fuera de las llamadas a los almacenes, la
 *    evaluación es O(1) por evento.
 *
 * # Mathematical Proof (Idempotent Re-evaluation):
 * Sea E un evento ya observado. record_window_event(E) retorna
 * freshly_inserted = false, y la evaluación retorna sin tocar alertas,
 * riesgo ni snapshots: re-procesar el stream no double-cuenta.
 * =================================================================
 */

use crate::config::GatewayConfig;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use vigil_domain_models::alert::OperatorAlert;
use vigil_domain_models::event::AnomalyEvent;
use vigil_domain_rules::{evaluate_event, event_delta};
use vigil_infra_db::repositories::{AlertRepository, SessionRepository, SnapshotRepository};
use vigil_infra_db::DbError;
use vigil_infra_ephemeral::TacticalCache;
use vigil_domain_models::snapshot::RiskScoreSnapshot;

/**
 * Motor de evaluación compartido por ambas rutas de ejecución.
 */
pub struct RulesEngine {
    config: Arc<GatewayConfig>,
    tactical_cache: TacticalCache,
    session_repository: Arc<SessionRepository>,
    alert_repository: Arc<AlertRepository>,
    snapshot_repository: Arc<SnapshotRepository>,
    /// Último tick de snapshot por sesión (cadencia de ≥ 60 s).
    last_snapshot_instants: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl RulesEngine {
    pub fn new(
        config: Arc<GatewayConfig>,
        tactical_cache: TacticalCache,
        session_repository: Arc<SessionRepository>,
        alert_repository: Arc<AlertRepository>,
        snapshot_repository: Arc<SnapshotRepository>,
    ) -> Self {
        Self {
            config,
            tactical_cache,
            session_repository,
            alert_repository,
            snapshot_repository,
            last_snapshot_instants: RwLock::new(HashMap::new()),
        }
    }

    /**
     * Evalúa un evento admitido: ventana deslizante, política de
     * severidad, gate de cooldown, riesgo decadente y tick de snapshot.
     *
     * Los fallos aquí se trazan y reintentan con el siguiente evento;
     * JAMÁS revientan la ingesta que los indujo.
     */
    #[instrument(skip(self, event), fields(event_id = %event.event_id, kind = %event.kind))]
    pub async fn evaluate(&self, event: &AnomalyEvent) -> Result<()> {
        let now = Utc::now();
        let kind_code = event.kind.as_code().to_string();

        // 1. VENTANA DESLIZANTE (insert-if-absent + poda + cardinal).
        let observation = self
            .tactical_cache
            .record_window_event(
                &event.session_id,
                &kind_code,
                &event.event_id,
                event.event_time,
                self.config.window_hard_cap,
                self.config.evaluation_window,
                self.config.window_ttl,
                now,
            )
            .await?;

        if !observation.freshly_inserted {
            debug!("🔁 [RULES_ENGINE]: Event already evaluated; idempotent no-op.");
            return Ok(());
        }

        // 2. POLÍTICA DE SEVERIDAD: max(declarada, computada).
        let decision = evaluate_event(&event.kind, event.severity, observation.evaluation_count);

        // 3. EMISIÓN DE ALERTA tras el gate de cooldown por (sesión, tipo).
        if decision.should_alert {
            let cooldown_epoch_count = self
                .tactical_cache
                .increment_alert_gate(&event.session_id, &kind_code, self.config.alert_cooldown, now)
                .await?;

            if cooldown_epoch_count == 1 {
                let mut alert_details = serde_json::Map::new();
                if let Some(confidence) = event.confidence {
                    alert_details.insert("confidence".to_string(), json!(confidence));
                }
                alert_details.insert("windowCount".to_string(), json!(observation.evaluation_count));
                alert_details
                    .insert("windowThreshold".to_string(), json!(decision.window_threshold_fired));

                let alert = OperatorAlert {
                    alert_id: Uuid::new_v4(),
                    session_id: event.session_id,
                    kind: event.kind.clone(),
                    severity: decision.final_severity,
                    created_at: now,
                    triggering_event_id: Some(event.event_id.clone()),
                    evidence_id: None,
                    details: serde_json::Value::Object(alert_details),
                };

                self.alert_repository.insert_alert(&alert).await?;
                info!("🚨 [RULES_ENGINE]: Alert emitted [{}] severity {}.",
                    kind_code, decision.final_severity.as_code());
            } else {
                debug!("🧊 [RULES_ENGINE]: Alert [{}] suppressed by cooldown epoch ({}).",
                    kind_code, cooldown_epoch_count);
            }
        }

        // 4. ACUMULADOR DE RIESGO: score := max(0, score × decay + delta).
        let risk_delta = event_delta(&event.kind, event.confidence);
        let updated_score = match self
            .session_repository
            .apply_risk_delta(&event.session_id, self.config.risk_decay_factor, risk_delta)
            .await
        {
            Ok(score) => score,
            Err(DbError::SessionEnded) => {
                // Re-evaluación tardía tras la clausura: sin mutación.
                warn!("🌙 [RULES_ENGINE]: Risk update skipped; session already ENDED.");
                return Ok(());
            }
            Err(database_fault) => return Err(database_fault.into()),
        };

        // 5. CADENCIA DE SNAPSHOT (≥ snapshot_interval por sesión).
        self.snapshot_if_due(event.session_id, updated_score, observation.evaluation_count, now)
            .await;

        Ok(())
    }

    /// Anexa una instantánea si venció la cadencia de la sesión.
    /// Un fallo de escritura revierte el tick para reintentar después.
    async fn snapshot_if_due(
        &self,
        session_id: Uuid,
        current_score: f64,
        window_count: u64,
        now: DateTime<Utc>,
    ) {
        let previous_tick = {
            let mut instants_guard = match self.last_snapshot_instants.write() {
                Ok(guard) => guard,
                Err(lock_poison_fault) => {
                    error!("💀 [RULES_ENGINE]: Snapshot cadence lock poisoned: {}", lock_poison_fault);
                    return;
                }
            };

            let cadence_due = instants_guard
                .get(&session_id)
                .map(|last_tick| now - *last_tick >= chrono::Duration::from_std(self.config.snapshot_interval).unwrap_or_else(|_| chrono::Duration::seconds(60)))
                .unwrap_or(true);

            if !cadence_due {
                return;
            }

            instants_guard.insert(session_id, now)
        };

        let snapshot = RiskScoreSnapshot {
            snapshot_id: Uuid::new_v4(),
            session_id,
            score: current_score,
            created_at: now,
            details: json!({ "trigger": "cadence", "windowCount": window_count }),
        };

        if let Err(snapshot_fault) = self.snapshot_repository.append(&snapshot).await {
            warn!("⚠️ [RULES_ENGINE]: Snapshot append failed (retry on next event): {}", snapshot_fault);

            // Reversión del tick: el siguiente evento reintenta.
            if let Ok(mut instants_guard) = self.last_snapshot_instants.write() {
                match previous_tick {
                    Some(recovered_tick) => {
                        instants_guard.insert(session_id, recovered_tick);
                    }
                    None => {
                        instants_guard.remove(&session_id);
                    }
                }
            }
        }
    }

    /**
     * Volcado cooperativo de cierre: anexa una instantánea final por
     * cada sesión con cadencia en vuelo antes de apagar la flota.
     */
    #[instrument(skip(self))]
    pub async fn flush_snapshots(&self) {
        let tracked_sessions: Vec<Uuid> = match self.last_snapshot_instants.read() {
            Ok(instants_guard) => instants_guard.keys().copied().collect(),
            Err(lock_poison_fault) => {
                error!("💀 [RULES_ENGINE]: Flush aborted; cadence lock poisoned: {}", lock_poison_fault);
                return;
            }
        };

        let flush_instant = Utc::now();
        for session_id in tracked_sessions {
            let session_lookup = self.session_repository.lookup(&session_id).await;
            let Ok(Some(session)) = session_lookup else { continue };

            let final_snapshot = RiskScoreSnapshot {
                snapshot_id: Uuid::new_v4(),
                session_id,
                score: session.current_risk_score,
                created_at: flush_instant,
                details: json!({ "trigger": "shutdown_flush" }),
            };

            if let Err(flush_fault) = self.snapshot_repository.append(&final_snapshot).await {
                warn!("⚠️ [RULES_ENGINE]: Final snapshot for {} lost: {}", session_id, flush_fault);
            }
        }

        info!("🏁 [RULES_ENGINE]: In-flight snapshots flushed.");
    }
}
