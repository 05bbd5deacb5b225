// [libs/domain/rules/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RULES DOMAIN LIBRARY ROOT (V4.0 - COGNITIVE STRATUM)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: MATEMÁTICA PURA DEL MOTOR DE REGLAS
 *
 * # Topología de Módulos:
 * - policy: Tabla de ventanas/umbrales y resolución de severidad.
 * - risk:   Deltas base y actualización decadente del acumulador.
 * - trust:  Fórmula post-sesión de confianza en [0, 100].
 *
 * Ningún módulo de este estrato toca IO: las decisiones se computan
 * sobre conteos y escalares que la capa de aplicación provee.
 * =================================================================
 */

pub mod policy;
pub mod risk;
pub mod trust;

pub use policy::{evaluate_event, RuleDecision, EVALUATION_WINDOW_SECONDS, WINDOW_HARD_CAP_SECONDS};
pub use risk::{decayed_update, event_delta, RISK_DECAY_FACTOR};
pub use trust::{extract_alert_confidence, trust_score};
