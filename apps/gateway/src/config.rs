// [apps/gateway/src/config.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY CONFIGURATION MATRIX (V6.0 - ENUMERATED OPTIONS)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L1-APP)
 * RESPONSABILIDAD: CAPTURA ÚNICA DE OPCIONES NOMINALES CON DEFAULTS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ENUMERATED SET: Cada opción tiene nombre 'VIGIL_*' y default
 *    documentado; nada de sondeo ad-hoc de entorno en el hot path.
 * 2. PROFILE QUARANTINE: El perfil de despliegue gobierna la forja de
 *    credenciales de desarrollo — jamás disponible en 'production'.
 * 3. SINGLE CAPTURE: Se hidrata UNA vez en la ignición y viaja en el
 *    AppState como referencia inmutable compartida.
 * =================================================================
 */

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use vigil_domain_rules::{EVALUATION_WINDOW_SECONDS, WINDOW_HARD_CAP_SECONDS};
use vigil_infra_credentials::CredentialKeySource;

/// Perfiles de despliegue reconocidos por el gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentProfile {
    /// Desarrollo local: forja de credenciales habilitada.
    Local,
    /// Contenedor de desarrollo: forja de credenciales habilitada.
    Docker,
    /// Despliegue real: la forja de credenciales NO se monta.
    Production,
}

impl DeploymentProfile {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "local" => Some(DeploymentProfile::Local),
            "docker" => Some(DeploymentProfile::Docker),
            "production" => Some(DeploymentProfile::Production),
            _ => None,
        }
    }

    /// Determina si el perfil admite el endpoint de emisión de desarrollo.
    pub fn allows_development_issuance(&self) -> bool {
        matches!(self, DeploymentProfile::Local | DeploymentProfile::Docker)
    }
}

/// Conjunto enumerado de opciones del gateway, con defaults normativos.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    // --- COORDENADAS DE INFRAESTRUCTURA ---
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub ephemeral_url: String,
    pub evidence_root: PathBuf,
    pub credential_key_source: CredentialKeySource,
    pub credential_signing_key_path: Option<PathBuf>,
    pub deployment_profile: DeploymentProfile,
    pub listening_port: u16,

    // --- POLÍTICA DE ADMISIÓN ---
    pub max_batch_bytes: usize,
    pub max_events_per_minute: i64,
    pub replay_ttl: Duration,
    pub time_skew: Duration,
    pub rate_counter_ttl: Duration,

    // --- POLÍTICA DEL MOTOR DE REGLAS ---
    pub alert_cooldown: Duration,
    pub risk_decay_factor: f64,
    pub snapshot_interval: Duration,
    pub window_hard_cap: Duration,
    pub evaluation_window: Duration,
    pub window_ttl: Duration,

    // --- CICLO DE VIDA Y RUNTIME ---
    pub session_stale_threshold: Duration,
    pub sweep_interval: Duration,
    pub ingest_deadline: Duration,
    pub read_deadline: Duration,
    pub stream_partitions: usize,
}

impl GatewayConfig {
    /**
     * Hidrata la configuración desde el entorno del proceso.
     *
     * # Errors:
     * Falla si la fuente de llave pública no está definida o si el
     * perfil de despliegue declarado no pertenece al conjunto.
     */
    pub fn from_environment() -> Result<Self> {
        let deployment_profile_code =
            env_or_default("VIGIL_DEPLOYMENT_PROFILE", "local");
        let Some(deployment_profile) = DeploymentProfile::from_code(&deployment_profile_code) else {
            bail!("UNKNOWN_DEPLOYMENT_PROFILE [{deployment_profile_code}]: expected local|docker|production");
        };

        // Fuente de llave: el keyset rotativo tiene precedencia nominal.
        let credential_key_source = match std::env::var("VIGIL_CREDENTIAL_KEYSET_DIR") {
            Ok(keyset_directory) if !keyset_directory.is_empty() => {
                CredentialKeySource::KeysetDirectory(PathBuf::from(keyset_directory))
            }
            _ => {
                let public_key_path = std::env::var("VIGIL_CREDENTIAL_PUBLIC_KEY")
                    .context("VIGIL_CREDENTIAL_PUBLIC_KEY or VIGIL_CREDENTIAL_KEYSET_DIR must be defined")?;
                CredentialKeySource::StaticPem(PathBuf::from(public_key_path))
            }
        };

        let credential_signing_key_path = std::env::var("VIGIL_CREDENTIAL_SIGNING_KEY")
            .ok()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            database_url: env_or_default("VIGIL_DATABASE_URL", "file:vigil-ledger.db"),
            database_auth_token: std::env::var("VIGIL_DATABASE_AUTH_TOKEN").ok(),
            ephemeral_url: env_or_default("VIGIL_EPHEMERAL_URL", "file:vigil-tactical.db"),
            evidence_root: PathBuf::from(env_or_default("VIGIL_EVIDENCE_ROOT", "./evidence-vault")),
            credential_key_source,
            credential_signing_key_path,
            deployment_profile,
            listening_port: parse_or_default("VIGIL_PORT", 8080),

            max_batch_bytes: parse_or_default("VIGIL_MAX_BATCH_BYTES", 65_536),
            max_events_per_minute: parse_or_default("VIGIL_MAX_EVENTS_PER_MINUTE", 600),
            replay_ttl: Duration::from_secs(parse_or_default("VIGIL_REPLAY_TTL_SECONDS", 3_600)),
            time_skew: Duration::from_secs(parse_or_default("VIGIL_TIME_SKEW_SECONDS", 300)),
            rate_counter_ttl: Duration::from_secs(parse_or_default("VIGIL_RATE_TTL_SECONDS", 120)),

            alert_cooldown: Duration::from_secs(parse_or_default("VIGIL_ALERT_COOLDOWN_SECONDS", 300)),
            risk_decay_factor: parse_or_default("VIGIL_RISK_DECAY_FACTOR", 0.98),
            snapshot_interval: Duration::from_secs(parse_or_default("VIGIL_SNAPSHOT_INTERVAL_SECONDS", 60)),
            window_hard_cap: Duration::from_secs(WINDOW_HARD_CAP_SECONDS as u64),
            evaluation_window: Duration::from_secs(EVALUATION_WINDOW_SECONDS as u64),
            window_ttl: Duration::from_secs(14_400),

            session_stale_threshold: Duration::from_secs(parse_or_default(
                "VIGIL_SESSION_STALE_THRESHOLD_SECONDS",
                600,
            )),
            sweep_interval: Duration::from_secs(parse_or_default("VIGIL_SWEEP_INTERVAL_SECONDS", 60)),
            ingest_deadline: Duration::from_secs(parse_or_default("VIGIL_INGEST_DEADLINE_SECONDS", 5)),
            read_deadline: Duration::from_secs(parse_or_default("VIGIL_READ_DEADLINE_SECONDS", 2)),
            stream_partitions: parse_or_default("VIGIL_STREAM_PARTITIONS", num_cpus::get().max(1)),
        })
    }

    /**
     * Configuración base para entornos de certificación (Proving Grounds):
     * Ledger y caché en RAM compartida, bóveda temporal y forja activa.
     */
    pub fn for_certification(
        database_url: impl Into<String>,
        ephemeral_url: impl Into<String>,
        evidence_root: impl Into<PathBuf>,
        credential_key_source: CredentialKeySource,
        credential_signing_key_path: Option<PathBuf>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            database_auth_token: None,
            ephemeral_url: ephemeral_url.into(),
            evidence_root: evidence_root.into(),
            credential_key_source,
            credential_signing_key_path,
            deployment_profile: DeploymentProfile::Local,
            listening_port: 0,

            max_batch_bytes: 65_536,
            max_events_per_minute: 600,
            replay_ttl: Duration::from_secs(3_600),
            time_skew: Duration::from_secs(300),
            rate_counter_ttl: Duration::from_secs(120),

            alert_cooldown: Duration::from_secs(300),
            risk_decay_factor: 0.98,
            snapshot_interval: Duration::from_secs(60),
            window_hard_cap: Duration::from_secs(WINDOW_HARD_CAP_SECONDS as u64),
            evaluation_window: Duration::from_secs(EVALUATION_WINDOW_SECONDS as u64),
            window_ttl: Duration::from_secs(14_400),

            session_stale_threshold: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
            ingest_deadline: Duration::from_secs(5),
            read_deadline: Duration::from_secs(2),
            stream_partitions: 2,
        }
    }
}

fn env_or_default(variable_name: &str, default_value: &str) -> String {
    std::env::var(variable_name)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_value.to_string())
}

fn parse_or_default<T: std::str::FromStr + Copy>(variable_name: &str, default_value: T) -> T {
    std::env::var(variable_name)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default_value)
}
