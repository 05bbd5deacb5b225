// [libs/domain/rules/src/trust.rs]
/*!
 * =================================================================
 * APARATO: TRUST SCORE FORMULA (V3.0 - DASHBOARD CONTRACT)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ESCALAR POST-SESIÓN DE CONFIANZA EN [0, 100]
 *
 * # Mathematical Proof:
 * trust = round(100 × mean(cᵢ)) sobre las alertas de la sesión cuya
 * clave details.confidence es numérica. El conjunto vacío proyecta 100
 * (ausencia de alertas = confianza plena en el intento).
 * =================================================================
 */

use serde_json::Value;

/// Extrae la confianza numérica del contexto de una alerta, si existe.
pub fn extract_alert_confidence(alert_details: &Value) -> Option<f64> {
    alert_details.get("confidence").and_then(Value::as_f64)
}

/// Fórmula del trust score sobre las confianzas recolectadas.
pub fn trust_score(alert_confidences: &[f64]) -> u32 {
    if alert_confidences.is_empty() {
        return 100;
    }

    let mean = alert_confidences.iter().sum::<f64>() / alert_confidences.len() as f64;
    (100.0 * mean).round() as u32
}
