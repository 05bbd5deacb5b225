// [libs/shared/argus/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ARGUS NEURAL OBSERVER (V4.0 - PROFILE AWARE)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: TELEMETRÍA ESTRUCTURADA Y CAPTURA DE PÁNICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PROFILE DRIVEN: El perfil de despliegue del gateway decide la
 *    superficie de emisión (JSON estructurado u interactiva); la
 *    compilación no adivina el entorno.
 * 2. NOISE QUARANTINE: El ruido de infraestructura del pipeline de
 *    ingesta (tower_http, hyper, libsql, jsonwebtoken) se declara
 *    como catálogo nominal de directivas.
 * 3. IDEMPOTENT IGNITION: 'try_init' tolera la re-ignición dentro del
 *    mismo proceso (Proving Grounds) sin pánico de suscriptor.
 * 4. FORENSIC COORDINATES: El escudo de pánicos emite file/line/column
 *    como campos estructurados para la ingesta del panóptico.
 * =================================================================
 */

use std::panic;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Catálogo de cuarentena: estratos de infraestructura cuyo detalle
/// ahogaría el rastro del dominio durante las ráfagas de admisión.
const INFRASTRUCTURE_NOISE_DIRECTIVES: &[&str] = &[
    "tower_http=warn",
    "hyper=warn",
    "libsql=error",
    "jsonwebtoken=warn",
];

/// Construye el filtro soberano: RUST_LOG del operador manda; en su
/// ausencia, el dominio del servicio en detalle y la infraestructura
/// bajo las directivas de cuarentena.
fn build_environmental_filter(service_nominal_identifier: &str) -> EnvFilter {
    if let Ok(operator_filter) = EnvFilter::try_from_default_env() {
        return operator_filter;
    }

    let domain_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let mut environmental_filter =
        EnvFilter::new(format!("{service_nominal_identifier}={domain_level}"));

    // Las directivas del catálogo son constantes validadas; una entrada
    // imparseable simplemente no se aplica.
    for noise_directive in INFRASTRUCTURE_NOISE_DIRECTIVES {
        if let Ok(parsed_directive) = noise_directive.parse() {
            environmental_filter = environmental_filter.add_directive(parsed_directive);
        }
    }

    environmental_filter
}

/// Inicializa el sistema de trazas Argus.
///
/// `structured_json_output` proviene del perfil de despliegue del
/// gateway: los perfiles de producción emiten tramas JSON planas para
/// el panóptico de operadores; los perfiles de desarrollo emiten la
/// superficie interactiva compacta.
///
/// La re-ignición dentro del mismo proceso es no-op: el suscriptor ya
/// instalado conserva la autoridad y el escudo de pánicos no se rearma.
pub fn init_tracing(service_nominal_identifier: &str, structured_json_output: bool) {
    let environmental_filter = build_environmental_filter(service_nominal_identifier);

    let ignition_result = if structured_json_output {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true).with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .try_init()
    };

    if ignition_result.is_err() {
        return;
    }

    arm_panic_shield(service_nominal_identifier);

    info!(
        "👁️  [ARGUS_ONLINE]: Observability strata levelized for [{}]. Panic shield ACTIVE.",
        service_nominal_identifier
    );
}

/// Hook global de pánicos: cualquier colapso en hilos secundarios
/// (flota de consumidores, sweeper) deja rastro forense estructurado
/// antes de la defunción del hilo.
fn arm_panic_shield(service_nominal_identifier: &str) {
    let service_id_snapshot = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let (panic_file, panic_line, panic_column) = panic_metadata
            .location()
            .map(|location| (location.file().to_string(), location.line(), location.column()))
            .unwrap_or_else(|| ("unknown".to_string(), 0, 0));

        let payload_analysis =
            if let Some(owned_text) = panic_metadata.payload().downcast_ref::<String>() {
                owned_text.clone()
            } else if let Some(static_text) = panic_metadata.payload().downcast_ref::<&str>() {
                (*static_text).to_string()
            } else {
                "OPAQUE_PANIC_PAYLOAD".to_string()
            };

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            file = %panic_file,
            line = panic_line,
            column = panic_column,
            "🔥 [PANIC_SHIELD]: Thread terminated abruptly: {}",
            payload_analysis
        );
    }));
}
