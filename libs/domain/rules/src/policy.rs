// [libs/domain/rules/src/policy.rs]
/*!
 * =================================================================
 * APARATO: SEVERITY POLICY ENGINE (V6.0 - PANOPTICON CALIBRATED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CLASIFICACIÓN DE SEVERIDAD POR VENTANA DESLIZANTE
 *
 * # Mathematical Proof (Severity Resolution):
 * Sea d la severidad declarada por el detector y c la computada por la
 * política de ventana. La severidad final es max(d, c) sobre la retícula
 * LOW < MEDIUM < HIGH < CRITICAL. Una alerta se emite si la severidad
 * final alcanza HIGH, o si el umbral de ventana del tipo disparó, con
 * la excepción de los tipos de solo-registro (LOW_LIGHT, desconocidos).
 * =================================================================
 */

use tracing::instrument;
use vigil_domain_models::event::{EventKind, SeverityLevel};

/// Ventana de evaluación de umbrales (5 minutos).
pub const EVALUATION_WINDOW_SECONDS: i64 = 300;

/// Cota dura de retención de marcas en la ventana deslizante (10 minutos).
pub const WINDOW_HARD_CAP_SECONDS: i64 = 600;

/// Veredicto puro del motor de reglas para un evento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDecision {
    /// Severidad final: max(declarada, computada).
    pub final_severity: SeverityLevel,
    /// Si la política manda emitir una alerta (antes del gate de cooldown).
    pub should_alert: bool,
    /// Si el disparo provino del umbral de ventana (y no de la severidad).
    pub window_threshold_fired: bool,
}

/// Severidad computada por la política para un tipo dado el conteo
/// de su ventana de evaluación (el conteo incluye el evento actual).
fn computed_severity(kind: &EventKind, window_count: u64) -> SeverityLevel {
    match kind {
        // Inmediato: múltiples rostros es la violación máxima.
        EventKind::MultiPerson => SeverityLevel::Critical,
        // Escalación por persistencia en 5 minutos.
        EventKind::FaceMissing | EventKind::CameraBlocked => {
            if window_count >= 3 { SeverityLevel::High } else { SeverityLevel::Low }
        }
        EventKind::TabSwitch => {
            if window_count >= 2 { SeverityLevel::Medium } else { SeverityLevel::Low }
        }
        EventKind::LookAway => {
            if window_count >= 5 { SeverityLevel::Medium } else { SeverityLevel::Low }
        }
        // Inmediato de severidad media, sin ventana.
        EventKind::SuspiciousObject => SeverityLevel::Medium,
        // Solo registro: nunca escala por sí mismo.
        EventKind::LowLight | EventKind::Unknown(_) => SeverityLevel::Low,
    }
}

/// Determina si el umbral de ventana del tipo disparó con este conteo.
fn window_threshold_fired(kind: &EventKind, window_count: u64) -> bool {
    match kind {
        EventKind::FaceMissing | EventKind::CameraBlocked => window_count >= 3,
        EventKind::TabSwitch => window_count >= 2,
        EventKind::LookAway => window_count >= 5,
        _ => false,
    }
}

/// Tipos excluidos del flujo de alertas (registro para auditoría).
fn attracts_alerts(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::LowLight | EventKind::Unknown(_))
}

/**
 * Evalúa la política completa para un evento.
 *
 * `declared_severity` es la severidad reportada por el detector (LOW si
 * ausente); `window_count` es el cardinal de la ventana de evaluación de
 * 5 minutos para (sesión, tipo), incluyendo el evento actual.
 */
#[instrument(level = "debug", skip(kind), fields(kind = %kind))]
pub fn evaluate_event(
    kind: &EventKind,
    declared_severity: SeverityLevel,
    window_count: u64,
) -> RuleDecision {
    let computed = computed_severity(kind, window_count);
    let final_severity = declared_severity.max(computed);
    let threshold = window_threshold_fired(kind, window_count);

    let should_alert = attracts_alerts(kind)
        && (final_severity >= SeverityLevel::High || threshold);

    RuleDecision {
        final_severity,
        should_alert,
        window_threshold_fired: threshold,
    }
}
