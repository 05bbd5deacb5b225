// [apps/gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (V7.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * # Mathematical Proof (Deterministic Ignition):
 * La configuración se captura ANTES de encender la observabilidad:
 * el perfil de despliegue decide la superficie de emisión de Argus.
 * Ambos Ledgers quedan conectados y el material de llave cargado
 * ANTES de la apertura del socket TCP, previniendo estados de
 * carrera donde un cliente de examen transmita lotes hacia un
 * pipeline aún no cristalizado.
 * =================================================================
 */

use vigil_gateway::prelude::*;

use dotenvy::dotenv;
use tracing::info;
use vigil_shared_argus::init_tracing;

/**
 * Punto de ignición supremo del binario del Gateway.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    // Hidrata las variables de .env en el espacio de nombres del proceso.
    dotenv().ok();

    // 2. ADQUISICIÓN DE COORDENADAS TÁCTICAS
    let gateway_configuration = GatewayConfig::from_environment()?;

    // 3. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (ARGUS)
    // El perfil de despliegue gobierna la superficie: JSON estructurado
    // en producción, interactiva en desarrollo.
    let structured_telemetry_surface =
        gateway_configuration.deployment_profile == DeploymentProfile::Production;
    init_tracing("vigil_gateway", structured_telemetry_surface);

    // 4. CONFIGURACIÓN DEL RUNTIME SOBERANO
    let runtime_gateway = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime_gateway.block_on(async {
        info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");

        // 5. CONSTRUCCIÓN DEL KERNEL SOBERANO (ESTRATO L1-APP)
        let kernel_instance = GatewayKernel::ignite(gateway_configuration).await?;

        // 6. IGNICIÓN DE OPERACIONES
        // Activa daemons de mantenimiento, flota de reglas y servidor Axum.
        kernel_instance.launch_gateway_operations().await?;

        Ok(())
    })
}
