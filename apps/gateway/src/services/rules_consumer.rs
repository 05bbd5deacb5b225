// [apps/gateway/src/services/rules_consumer.rs]
/*!
 * =================================================================
 * APARATO: RULES CONSUMER FLEET (V6.0 - COOPERATIVE PARTITIONS)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: RUTA ASÍNCRONA DEL MOTOR DE REGLAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE WORKER PER PARTITION: Un consumidor cooperativo por partición
 *    del stream; el orden por sesión queda garantizado por afinidad.
 * 2. GRACEFUL STOP: La señal de parada 'watch' termina cada worker al
 *    final del sobre en curso; el Kernel vuelca los snapshots en vuelo
 *    tras el repliegue de la flota.
 * 3. FAILURE CONTAINMENT: Un fallo de evaluación se traza y el worker
 *    continúa con el siguiente sobre.
 * =================================================================
 */

use crate::services::event_stream::EventStreamHub;
use crate::services::rules_engine::RulesEngine;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/**
 * Despliega la flota de consumidores: un worker por partición.
 * Retorna los handles para que el Kernel espere el repliegue ordenado.
 */
pub fn spawn_rules_consumer_fleet(
    event_stream: Arc<EventStreamHub>,
    rules_engine: Arc<RulesEngine>,
    stop_signal: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let Some(partition_receivers) = event_stream.take_partition_receivers() else {
        warn!("⚠️ [RULES_FLEET]: Partition receivers already claimed; fleet not deployed.");
        return Vec::new();
    };

    info!("🛰️  [RULES_FLEET]: Deploying {} partition consumers.", partition_receivers.len());

    partition_receivers
        .into_iter()
        .enumerate()
        .map(|(partition_index, mut partition_receiver)| {
            let engine = rules_engine.clone();
            let mut stop_receiver = stop_signal.clone();

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        maybe_envelope = partition_receiver.recv() => {
                            match maybe_envelope {
                                Some(envelope) => {
                                    if let Err(evaluation_fault) = engine.evaluate(&envelope.event).await {
                                        error!(
                                            "⚠️ [RULES_FLEET:{}]: Evaluation fault for event [{}]: {}",
                                            partition_index, envelope.event.event_id, evaluation_fault
                                        );
                                    }
                                }
                                None => {
                                    info!("🏁 [RULES_FLEET:{}]: Stream sealed; worker retiring.", partition_index);
                                    break;
                                }
                            }
                        }
                        stop_changed = stop_receiver.changed() => {
                            let stop_engaged = stop_changed.is_err() || *stop_receiver.borrow();
                            if stop_engaged {
                                info!("🛑 [RULES_FLEET:{}]: Cooperative stop engaged.", partition_index);
                                break;
                            }
                        }
                    }
                }
            })
        })
        .collect()
}
