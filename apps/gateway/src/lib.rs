// [apps/gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY LIBRARY ROOT (V5.0 - SOVEREIGN AUTHORITY)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE MÓDULOS
 *
 * # Mathematical Proof (Modular Encapsulation):
 * Al declarar 'pub mod' aquí, Rust genera un grafo de visibilidad
 * donde estado, rutas y servicios son hermanos bajo el mismo tronco
 * 'crate', habilitando la inyección de dependencias en compilación.
 * =================================================================
 */

// --- ESTRATO DE INFRAESTRUCTURA Y ARRANQUE ---
/// Conjunto enumerado de opciones del gateway con defaults.
pub mod config;
/// Núcleo de mando para la ignición de servicios.
pub mod kernel;

// --- ESTRATO DE DATOS Y ESTADO (L1-APP) ---
/// Gestor del sistema nervioso central del gateway.
pub mod state;

// --- ESTRATO DE TRANSPORTE Y ACCIÓN ---
/// Proyección HTTP del catálogo semántico de fallos.
pub mod errors;
/// Adaptadores de entrada para ráfagas HTTP.
pub mod handlers;
/// El túnel de mando: definición de rutas y topología de red.
pub mod routes;

// --- ESTRATO DE SEGURIDAD Y SOPORTE ---
/// Guardián perimetral de credenciales portadoras.
pub mod middleware;
/// Motores de evaluación y daemons de fondo.
pub mod services;

/**
 * PRELUDIO DEL GATEWAY
 *
 * Re-exportación estratégica de los componentes necesarios para la
 * ignición mínima del sistema desde 'main.rs'.
 */
pub mod prelude {
    pub use crate::config::{DeploymentProfile, GatewayConfig};
    pub use crate::kernel::GatewayKernel;
    pub use crate::state::AppState;
}
