// [apps/gateway/src/services/event_stream.rs]
/*!
 * =================================================================
 * APARATO: PARTITIONED EVENT STREAM HUB (V5.0 - SESSION KEYED)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DIFUSIÓN DE EVENTOS ADMITIDOS HACIA LOS CONSUMIDORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SESSION AFFINITY: La partición se deriva del hash del session_id;
 *    todos los eventos de una sesión viajan por el mismo canal, lo que
 *    preserva el orden por sesión en la ruta asíncrona.
 * 2. BACKPRESSURE SHIELD: Canales acotados; una partición saturada
 *    descarta el sobre con rastro de advertencia en lugar de bloquear
 *    la admisión (el consumidor re-evalúa de forma idempotente).
 * =================================================================
 */

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;
use vigil_domain_models::event::AnomalyEvent;

/// Capacidad por partición del canal de difusión soberano.
const PARTITION_CHANNEL_CAPACITY: usize = 4096;

/// Sobre de transporte del stream de eventos admitidos.
#[derive(Debug, Clone)]
pub struct StreamEnvelope {
    pub event: AnomalyEvent,
}

/**
 * Hub del stream particionado (el sistema nervioso de la ruta asíncrona).
 */
pub struct EventStreamHub {
    partition_senders: Vec<mpsc::Sender<StreamEnvelope>>,
    /// Receptores en letargo hasta que el Kernel despliega la flota.
    dormant_partition_receivers: Mutex<Option<Vec<mpsc::Receiver<StreamEnvelope>>>>,
}

impl EventStreamHub {
    /// Forja el hub con un canal acotado por partición.
    pub fn new(partition_count: usize) -> Self {
        let effective_partitions = partition_count.max(1);
        let mut senders = Vec::with_capacity(effective_partitions);
        let mut receivers = Vec::with_capacity(effective_partitions);

        for _ in 0..effective_partitions {
            let (sender, receiver) = mpsc::channel(PARTITION_CHANNEL_CAPACITY);
            senders.push(sender);
            receivers.push(receiver);
        }

        Self {
            partition_senders: senders,
            dormant_partition_receivers: Mutex::new(Some(receivers)),
        }
    }

    /// Cantidad de particiones activas del stream.
    pub fn partition_count(&self) -> usize {
        self.partition_senders.len()
    }

    /// Partición determinista de una sesión (hash estable módulo N).
    pub fn partition_for(&self, session_id: &Uuid) -> usize {
        let mut hasher = DefaultHasher::new();
        session_id.hash(&mut hasher);
        (hasher.finish() % self.partition_senders.len() as u64) as usize
    }

    /**
     * Publica un evento admitido en su partición de sesión.
     * Una partición saturada descarta el sobre con advertencia; la
     * evaluación inline ya ocurrió en la admisión.
     */
    pub fn publish(&self, event: AnomalyEvent) {
        let partition_index = self.partition_for(&event.session_id);
        let envelope = StreamEnvelope { event };

        match self.partition_senders[partition_index].try_send(envelope) {
            Ok(()) => {
                debug!("📡 [EVENT_STREAM]: Envelope routed to partition {}.", partition_index);
            }
            Err(mpsc::error::TrySendError::Full(dropped_envelope)) => {
                warn!(
                    "⚠️ [EVENT_STREAM]: Partition {} saturated; envelope for event [{}] dropped.",
                    partition_index, dropped_envelope.event.event_id
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("⚠️ [EVENT_STREAM]: Partition {} closed; consumer fleet offline.", partition_index);
            }
        }
    }

    /// Entrega los receptores al Kernel (una sola vez) para desplegar
    /// un consumidor cooperativo por partición.
    pub fn take_partition_receivers(&self) -> Option<Vec<mpsc::Receiver<StreamEnvelope>>> {
        match self.dormant_partition_receivers.lock() {
            Ok(mut dormant_guard) => dormant_guard.take(),
            Err(_) => None,
        }
    }
}
