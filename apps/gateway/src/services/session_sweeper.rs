// [apps/gateway/src/services/session_sweeper.rs]
/**
 * =================================================================
 * APARATO: SESSION SWEEPER DAEMON (V5.0 - HYGIENE HARDENED)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: CLAUSURA DE SESIONES SIN LATIDO Y JANITOR DE CACHÉ
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDEMPOTENT SWEEP: La transición ACTIVE -> ENDED por latido caduco
 *    es una sola sentencia; repetir el barrido no altera el resultado.
 * 2. TACTICAL HYGIENE: El mismo ciclo purga físicamente las filas
 *    caducas del estrato efímero (la corrección no depende de ello).
 * 3. COOPERATIVE STOP: El daemon respeta la señal de parada del Kernel.
 * =================================================================
 */

use crate::state::AppState;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};

/**
 * Inicia el daemon de barrido perpetuo en el runtime de Tokio.
 */
pub fn spawn_session_sweeper(application_state: AppState, mut stop_signal: watch::Receiver<bool>) {
    let sweep_cadence = application_state.config.sweep_interval;
    let stale_threshold = application_state.config.session_stale_threshold;

    tokio::spawn(async move {
        let mut maintenance_ticker = interval(sweep_cadence);

        info!("💀 [SWEEPER_ACTIVE]: Session hygiene daemon initiated (cadence {:?}).", sweep_cadence);

        loop {
            tokio::select! {
                _ = maintenance_ticker.tick() => {
                    let now = Utc::now();

                    // 1. CLAUSURA DE SESIONES SIN LATIDO (umbral configurable).
                    let stale_before = now
                        - chrono::Duration::from_std(stale_threshold)
                            .unwrap_or_else(|_| chrono::Duration::seconds(600));

                    match application_state.session_repository.sweep_stale(stale_before, now).await {
                        Ok(sealed_count) if sealed_count > 0 => {
                            info!("💀 [SWEEPER]: Sealed {} heartbeat-stale sessions.", sealed_count);
                        }
                        Ok(_) => {}
                        Err(sweep_fault) => {
                            error!("⚠️ [SWEEPER]: Stale sweep cycle failed: {}", sweep_fault);
                        }
                    }

                    // 2. PURGA FÍSICA DEL ESTRATO EFÍMERO.
                    if let Err(janitor_fault) = application_state.tactical_cache.purge_expired(now).await {
                        error!("⚠️ [SWEEPER]: Tactical cache purge failed: {}", janitor_fault);
                    }
                }
                stop_changed = stop_signal.changed() => {
                    let stop_engaged = stop_changed.is_err() || *stop_signal.borrow();
                    if stop_engaged {
                        info!("🛑 [SWEEPER]: Cooperative stop engaged; daemon retiring.");
                        break;
                    }
                }
            }
        }
    });
}
