// [libs/domain/rules/src/risk.rs]
/*!
 * =================================================================
 * APARATO: DECAYING RISK ACCUMULATOR (V5.1 - CALIBRATED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DELTAS BASE Y ACTUALIZACIÓN DECADENTE DEL RIESGO
 *
 * # Mathematical Proof (Monotone Silence):
 * score' = max(0, score × d + Δ) con d = 0.98 y Δ ≥ 0. Con Δ = 0 el
 * acumulador es no-creciente, y max(0, ·) garantiza la no-negatividad
 * en todo estado observable.
 * =================================================================
 */

use vigil_domain_models::event::EventKind;

/// Factor de decaimiento multiplicativo aplicado por evento.
pub const RISK_DECAY_FACTOR: f64 = 0.98;

/// Delta base de riesgo por tipo de señal. Los tipos fuera de la tabla
/// (incluidos los desconocidos) aportan el delta mínimo de auditoría.
fn base_delta(kind: &EventKind) -> f64 {
    match kind {
        EventKind::MultiPerson => 50.0,
        EventKind::SuspiciousObject => 20.0,
        EventKind::FaceMissing => 15.0,
        EventKind::CameraBlocked => 15.0,
        EventKind::LookAway => 5.0,
        EventKind::LowLight => 2.0,
        EventKind::TabSwitch | EventKind::Unknown(_) => 1.0,
    }
}

/// Delta efectivo de un evento: base(tipo) ponderada por la confianza
/// del detector (1 cuando no fue reportada; acotada a [0, 1]).
pub fn event_delta(kind: &EventKind, confidence: Option<f64>) -> f64 {
    let confidence_weight = confidence.unwrap_or(1.0).clamp(0.0, 1.0);
    base_delta(kind) * confidence_weight
}

/// Actualización atómica del acumulador: max(0, current × decay + delta).
pub fn decayed_update(current_score: f64, delta: f64, decay_factor: f64) -> f64 {
    (current_score * decay_factor + delta).max(0.0)
}
