// [libs/infra/db-turso/src/client.rs]
/*!
 * =================================================================
 * APARATO: LEDGER CONNECTION CLIENT (V6.0 - CONTENTION TUNED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CLASIFICACIÓN DE DESTINO, AFINACIÓN Y BOOTSTRAP
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NOMINAL TOPOLOGY: El destino del Ledger se clasifica en un enum
 *    soberano (réplica remota / disco local / memoria anclada) antes
 *    de encender el driver; nada de booleanos sueltos.
 * 2. SINGLE BOOTSTRAP PATH: UNA sola conexión de bootstrap afina el
 *    almacenamiento y solidifica el esquema; en memoria compartida
 *    esa misma conexión queda retenida como ancla del segmento.
 * 3. ADMISSION TUNING: Los lotes concurrentes de proctoring golpean
 *    el Ledger desde muchas tareas; el disco local opera en WAL para
 *    que las lecturas del panóptico no bloqueen a los escritores.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_ledger_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Contención tolerada por el DDL de ignición si otro proceso del
/// gateway está a mitad de escritura (ms).
const BOOTSTRAP_BUSY_TIMEOUT_MS: u32 = 5_000;

/// Destino clasificado del Ledger durable.
enum LedgerLocation {
    /// Réplica libSQL remota; exige token de acceso.
    RemoteReplica { url: String, access_token: String },
    /// Archivo SQLite local; opera en journal WAL.
    LocalDisk(String),
    /// Memoria compartida; exige un ancla viva contra la purga de SQLite.
    AnchoredMemory(String),
}

impl LedgerLocation {
    fn classify(
        database_connection_url: &str,
        database_access_token: Option<String>,
    ) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL_UNDEFINED".into()));
        }

        if database_connection_url.starts_with("libsql://")
            || database_connection_url.starts_with("https://")
        {
            let access_token = database_access_token.ok_or_else(|| {
                DbError::ConfigurationError("REMOTE_ACCESS_DENIED: auth token missing".into())
            })?;
            return Ok(LedgerLocation::RemoteReplica {
                url: database_connection_url.to_string(),
                access_token,
            });
        }

        if database_connection_url.contains(":memory:")
            || database_connection_url.contains("mode=memory")
        {
            return Ok(LedgerLocation::AnchoredMemory(database_connection_url.to_string()));
        }

        Ok(LedgerLocation::LocalDisk(database_connection_url.to_string()))
    }

    fn describe(&self) -> &'static str {
        match self {
            LedgerLocation::RemoteReplica { .. } => "remote-replica",
            LedgerLocation::LocalDisk(_) => "local-disk",
            LedgerLocation::AnchoredMemory(_) => "anchored-memory",
        }
    }
}

#[derive(Clone)]
pub struct TursoClient {
    internal_database_driver: Arc<Database>,
    /// Presente solo en memoria compartida: mantiene vivo el segmento.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl TursoClient {
    #[instrument(skip(database_access_token))]
    pub async fn connect(
        database_connection_url: &str,
        database_access_token: Option<String>,
    ) -> Result<Self, DbError> {
        let ledger_location =
            LedgerLocation::classify(database_connection_url, database_access_token)?;

        info!(
            "🔌 [LEDGER]: Igniting {} link to [{}]",
            ledger_location.describe(),
            database_connection_url
        );

        let database_driver = match &ledger_location {
            LedgerLocation::RemoteReplica { url, access_token } => {
                Builder::new_remote(url.clone(), access_token.clone()).build().await
            }
            LedgerLocation::LocalDisk(path) | LedgerLocation::AnchoredMemory(path) => {
                Builder::new_local(path.as_str()).build().await
            }
        }
        .map_err(|driver_fault| {
            DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {driver_fault}"))
        })?;

        let shared_driver = Arc::new(database_driver);

        // Ruta única de bootstrap: la misma conexión afina el
        // almacenamiento y solidifica el esquema, sea cual sea el destino.
        let bootstrap_connection = shared_driver.connect().map_err(|link_fault| {
            DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {link_fault}"))
        })?;

        tune_ledger_storage(&bootstrap_connection, &ledger_location).await?;

        apply_ledger_schema(&bootstrap_connection)
            .await
            .map_err(|schema_fault| {
                DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {schema_fault}"))
            })?;

        // Solo la memoria compartida retiene la conexión de bootstrap.
        let memory_persistence_anchor = match &ledger_location {
            LedgerLocation::AnchoredMemory(_) => {
                info!("⚓ [LEDGER]: Memory strata solidified and anchored.");
                Some(Arc::new(bootstrap_connection))
            }
            _ => None,
        };

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: memory_persistence_anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.internal_database_driver.connect().map_err(|allocation_fault| {
            error!("⚠️ [LEDGER_POOL]: Connection allocation refused: {}", allocation_fault);
            DbError::ConnectionError(allocation_fault.to_string())
        })
    }
}

/**
 * Afinación del almacenamiento para el patrón de acceso del gateway:
 * muchas tareas de admisión escribiendo eventos pequeños mientras el
 * panóptico lee alertas y resúmenes.
 *
 * - busy_timeout cubre el DDL de ignición ante otro proceso a mitad
 *   de escritura.
 * - journal WAL (persistente en el archivo) evita que los lectores
 *   bloqueen a los escritores; solo aplica al disco local.
 * - Las réplicas remotas gobiernan sus PRAGMA del lado del servidor.
 */
async fn tune_ledger_storage(
    bootstrap_connection: &Connection,
    ledger_location: &LedgerLocation,
) -> Result<(), DbError> {
    if matches!(ledger_location, LedgerLocation::RemoteReplica { .. }) {
        return Ok(());
    }

    // PRAGMA responde con una fila; se consulta y se descarta.
    let _ = bootstrap_connection
        .query(&format!("PRAGMA busy_timeout = {BOOTSTRAP_BUSY_TIMEOUT_MS}"), ())
        .await?;

    if matches!(ledger_location, LedgerLocation::LocalDisk(_)) {
        let _ = bootstrap_connection.query("PRAGMA journal_mode = WAL", ()).await?;
        debug!("🗞️ [LEDGER]: WAL journal engaged for concurrent admission writers.");
    }

    Ok(())
}
