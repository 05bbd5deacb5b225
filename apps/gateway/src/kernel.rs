// [apps/gateway/src/kernel.rs]
/**
 * =================================================================
 * APARATO: GATEWAY SOVEREIGN KERNEL (V9.0 - GRACEFUL FLEET)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * despliega el sweeper de sesiones, la flota de consumidores de reglas
 * (una por partición del stream) y el servidor HTTP, y orquesta el
 * repliegue cooperativo con volcado de snapshots en vuelo.
 * =================================================================
 */

use crate::config::GatewayConfig;
use crate::routes::create_gateway_router;
use crate::services::{spawn_rules_consumer_fleet, spawn_session_sweeper};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::{info, instrument};

pub struct GatewayKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
}

impl GatewayKernel {
    /**
     * Realiza la ignición de ambos Ledgers y el estado compartido.
     * Establece las conexiones antes de levantar servicio alguno.
     */
    #[instrument(skip(config))]
    pub async fn ignite(config: GatewayConfig) -> Result<Self> {
        let server_network_port = config.listening_port;
        let application_shared_state = AppState::ignite(config).await?;

        Ok(Self {
            server_network_port,
            application_shared_state,
        })
    }

    /**
     * Lanza la ejecución de todas las operaciones autónomas del gateway:
     * daemons de fondo, flota de consumidores y servidor Axum.
     */
    pub async fn launch_gateway_operations(self) -> Result<()> {
        let shared_application_state = self.application_shared_state.clone();

        // --- 1. SEÑAL DE PARADA COOPERATIVA (Kernel -> Daemons) ---
        let (stop_signal_sender, stop_signal_receiver) = watch::channel(false);

        // --- 2. DAEMON DE HIGIENE DE SESIONES Y CACHÉ ---
        spawn_session_sweeper(shared_application_state.clone(), stop_signal_receiver.clone());

        // --- 3. FLOTA DE CONSUMIDORES DE REGLAS (ruta asíncrona) ---
        let consumer_fleet_handles = spawn_rules_consumer_fleet(
            shared_application_state.event_stream.clone(),
            shared_application_state.rules_engine.clone(),
            stop_signal_receiver,
        );

        // --- 4. IGNICIÓN DEL SERVIDOR HTTP SOBERANO ---
        let sovereign_router = create_gateway_router(shared_application_state.clone());
        let listening_address = SocketAddr::from(([0, 0, 0, 0], self.server_network_port));

        let network_listener = tokio::net::TcpListener::bind(listening_address)
            .await
            .with_context(|| format!("SOCKET_BIND_FAILURE [{listening_address}]"))?;

        info!("🚀 [VIGIL_ONLINE]: Gateway fully operational on port {}.", self.server_network_port);

        axum::serve(network_listener, sovereign_router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("🛑 [KERNEL]: Shutdown signal received; sealing intake.");
            })
            .await
            .context("HTTP_SERVER_COLLAPSE")?;

        // --- 5. REPLIEGUE COOPERATIVO Y VOLCADO FINAL ---
        let _ = stop_signal_sender.send(true);
        for consumer_handle in consumer_fleet_handles {
            let _ = consumer_handle.await;
        }
        shared_application_state.rules_engine.flush_snapshots().await;

        info!("🏁 [KERNEL]: Gateway retired cleanly.");
        Ok(())
    }
}
