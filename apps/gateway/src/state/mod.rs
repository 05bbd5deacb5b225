// [apps/gateway/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V8.0 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, CACHÉ Y MOTORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: Centraliza la ignición de los cinco repositorios
 *    del Ledger, la caché táctica, la bóveda de evidencia, la autoridad
 *    de credenciales y el motor de reglas dual-path.
 * 2. SINGLETON ADAPTERS: Cada adaptador de almacén se hidrata UNA vez
 *    y viaja como 'Arc<T>' inmutable por todos los estratos.
 * 3. DEV FORGE QUARANTINE: La forja de credenciales solo se construye
 *    cuando el perfil de despliegue la admite Y hay llave de firma.
 * =================================================================
 */

use crate::config::GatewayConfig;
use crate::services::event_stream::EventStreamHub;
use crate::services::rules_engine::RulesEngine;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vigil_infra_blobstore::EvidenceVault;
use vigil_infra_credentials::{CredentialVerifier, DevelopmentCredentialForge};
use vigil_infra_db::repositories::{
    AlertRepository, EventRepository, EvidenceRepository, SessionRepository, SnapshotRepository,
};
use vigil_infra_db::TursoClient;
use vigil_infra_ephemeral::TacticalCache;

/**
 * Contenedor de estado compartido (Thread-Safe) del Gateway.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Configuración enumerada capturada en la ignición.
    pub config: Arc<GatewayConfig>,
    /// Cliente táctico del Ledger durable (Motor A).
    pub database_client: TursoClient,
    /// Caché efímera de llave única con TTL (Ledger B).
    pub tactical_cache: TacticalCache,
    /// Bóveda de blobs de evidencia con localizadores opacos.
    pub evidence_vault: EvidenceVault,
    /// Autoridad de verificación de credenciales portadoras.
    pub credential_verifier: Arc<CredentialVerifier>,
    /// Forja de tokens de desarrollo (solo perfiles local/docker).
    pub development_forge: Option<Arc<DevelopmentCredentialForge>>,

    // --- REPOSITORIOS DEL LEDGER (ESTRATO L3) ---
    pub session_repository: Arc<SessionRepository>,
    pub event_repository: Arc<EventRepository>,
    pub alert_repository: Arc<AlertRepository>,
    pub evidence_repository: Arc<EvidenceRepository>,
    pub snapshot_repository: Arc<SnapshotRepository>,

    // --- MOTORES DE EVALUACIÓN (ESTRATO L4) ---
    /// Motor de reglas compartido por el hook inline y los consumidores.
    pub rules_engine: Arc<RulesEngine>,
    /// Hub del stream particionado de eventos admitidos.
    pub event_stream: Arc<EventStreamHub>,
}

impl AppState {
    /**
     * Forja la instancia del Estado Maestro inyectando todas las
     * dependencias. Conecta ambos Ledgers antes de levantar servicios.
     */
    pub async fn ignite(config: GatewayConfig) -> Result<Self> {
        debug!("🧬 [APP_STATE]: Executing sovereign ignition sequence...");

        let database_client =
            TursoClient::connect(&config.database_url, config.database_auth_token.clone())
                .await
                .context("LEDGER_IGNITION_FAILURE")?;

        let tactical_cache = TacticalCache::connect(&config.ephemeral_url)
            .await
            .context("TACTICAL_CACHE_IGNITION_FAILURE")?;

        let evidence_vault = EvidenceVault::open(config.evidence_root.clone());

        let credential_verifier = Arc::new(
            CredentialVerifier::from_source(&config.credential_key_source)
                .context("CREDENTIAL_AUTHORITY_IGNITION_FAILURE")?,
        );

        // Forja de desarrollo: solo si el perfil la admite Y hay llave.
        let development_forge = if config.deployment_profile.allows_development_issuance() {
            match &config.credential_signing_key_path {
                Some(signing_key_path) => {
                    let forge = DevelopmentCredentialForge::from_pem_file(signing_key_path, None)
                        .context("DEVELOPMENT_FORGE_IGNITION_FAILURE")?;
                    warn!("🧪 [APP_STATE]: Development credential forge ACTIVE (dev profile).");
                    Some(Arc::new(forge))
                }
                None => None,
            }
        } else {
            None
        };

        // Pre-hidratación de repositorios soberanos.
        let session_repository = Arc::new(SessionRepository::new(database_client.clone()));
        let event_repository = Arc::new(EventRepository::new(database_client.clone()));
        let alert_repository = Arc::new(AlertRepository::new(database_client.clone()));
        let evidence_repository = Arc::new(EvidenceRepository::new(database_client.clone()));
        let snapshot_repository = Arc::new(SnapshotRepository::new(database_client.clone()));

        let shared_config = Arc::new(config);

        // Ignición del motor cognitivo compartido (inline + async).
        let rules_engine = Arc::new(RulesEngine::new(
            shared_config.clone(),
            tactical_cache.clone(),
            session_repository.clone(),
            alert_repository.clone(),
            snapshot_repository.clone(),
        ));

        let event_stream = Arc::new(EventStreamHub::new(shared_config.stream_partitions));

        info!("🧬 [APP_STATE]: All strata levelized. Composition root sealed.");

        Ok(Self {
            config: shared_config,
            database_client,
            tactical_cache,
            evidence_vault,
            credential_verifier,
            development_forge,
            session_repository,
            event_repository,
            alert_repository,
            evidence_repository,
            snapshot_repository,
            rules_engine,
            event_stream,
        })
    }
}
