// [libs/infra/ephemeral/src/store.rs]
/*!
 * =================================================================
 * APARATO: TACTICAL CACHE STORE (V6.0 - ATOMIC SINGLE-KEY)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DEDUP, RÁFAGA, VENTANAS Y GATES CON TTL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LOCK-FREE HOT PATH: Cada primitiva (set-if-absent, increment,
 *    window add+prune+count) es UNA sentencia SQL o UNA transacción;
 *    la admisión jamás toma cerrojos gruesos.
 * 2. RESTART SURVIVAL: El respaldo file-backed preserva los marcadores
 *    a través de reinicios por al menos su TTL más largo (4 h).
 * 3. LAZY EXPIRY: Las filas caducas se reinterpretan como ausentes en
 *    cada operación; el janitor las purga físicamente en segundo plano.
 *
 * # Mathematical Proof (Replay Suppression):
 * 'acquire' retorna true exactamente una vez por llave dentro de su
 * TTL: el INSERT gana, o el ON CONFLICT revive una fila caduca; en
 * cualquier otro caso RETURNING no emite fila y el evento es duplicado.
 * =================================================================
 */

use crate::errors::CacheError;
use crate::keyspace;
use chrono::{DateTime, Utc};
use libsql::{params, Builder, Connection, Database};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Génesis idempotente de las tablas del estrato efímero.
const CACHE_TABLES: &[(&str, &str)] = &[
    ("TABLE_REPLAY_MARKERS", r#"
        CREATE TABLE IF NOT EXISTS replay_markers (
            marker_key TEXT PRIMARY KEY,
            expires_at_ms INTEGER NOT NULL
        );
    "#),
    ("TABLE_RATE_COUNTERS", r#"
        CREATE TABLE IF NOT EXISTS rate_counters (
            counter_key TEXT PRIMARY KEY,
            counter_value INTEGER NOT NULL DEFAULT 0,
            expires_at_ms INTEGER NOT NULL
        );
    "#),
    ("TABLE_WINDOW_ENTRIES", r#"
        CREATE TABLE IF NOT EXISTS window_entries (
            window_key TEXT NOT NULL,
            member_identifier TEXT NOT NULL,
            event_time_ms INTEGER NOT NULL,
            expires_at_ms INTEGER NOT NULL,
            PRIMARY KEY (window_key, member_identifier)
        );
    "#),
];

const CACHE_INDEXES: &[(&str, &str)] = &[
    ("IDX_WINDOW_TIME", "CREATE INDEX IF NOT EXISTS idx_window_time ON window_entries(window_key, event_time_ms);"),
    ("IDX_WINDOW_EXPIRY", "CREATE INDEX IF NOT EXISTS idx_window_expiry ON window_entries(expires_at_ms);"),
];

/// Observación atómica de la ventana deslizante tras registrar un evento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowObservation {
    /// true si el event_id entró por primera vez a la ventana.
    /// Es el gate de idempotencia del motor de reglas dual-path.
    pub freshly_inserted: bool,
    /// Cardinal de la ventana de evaluación, incluyendo este evento.
    pub evaluation_count: u64,
}

/// Caché táctica de llave única con TTL (Ledger B).
#[derive(Clone)]
pub struct TacticalCache {
    internal_cache_driver: Arc<Database>,
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl TacticalCache {
    #[instrument]
    pub async fn connect(cache_connection_url: &str) -> Result<Self, CacheError> {
        if cache_connection_url.is_empty() {
            return Err(CacheError::ConfigurationError("EPHEMERAL_URL_UNDEFINED".into()));
        }

        info!("🔌 [TACTICAL_CACHE]: Initiating ephemeral strata link to [{}]", cache_connection_url);

        let cache_driver = Builder::new_local(cache_connection_url)
            .build()
            .await
            .map_err(|driver_fault| {
                CacheError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {driver_fault}"))
            })?;

        let shared_driver = Arc::new(cache_driver);

        let is_memory = cache_connection_url.contains(":memory:")
            || cache_connection_url.contains("mode=memory");

        let bootstrap_connection = shared_driver.connect().map_err(|link_fault| {
            CacheError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {link_fault}"))
        })?;

        for (identifier, sql) in CACHE_TABLES {
            bootstrap_connection.execute(*sql, ()).await.map_err(|schema_fault| {
                CacheError::ConnectionError(format!("SCHEMA_SYNC_FAULT [{identifier}]: {schema_fault}"))
            })?;
        }
        for (identifier, sql) in CACHE_INDEXES {
            bootstrap_connection.execute(*sql, ()).await.map_err(|schema_fault| {
                CacheError::ConnectionError(format!("SCHEMA_SYNC_FAULT [{identifier}]: {schema_fault}"))
            })?;
        }

        // En modo RAM el ancla evita que SQLite purgue el segmento compartido.
        let anchor = if is_memory { Some(Arc::new(bootstrap_connection)) } else { None };

        Ok(Self {
            internal_cache_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    fn get_connection(&self) -> Result<Connection, CacheError> {
        self.internal_cache_driver.connect().map_err(|allocation_fault| {
            warn!("⚠️ [CACHE_POOL_FAULT]: Connection allocation failed: {}", allocation_fault);
            CacheError::ConnectionError(allocation_fault.to_string())
        })
    }

    // --- ESTRATO 1: SUPRESIÓN DE REPLAY (set-if-absent con TTL) ---

    /**
     * Reclama atómicamente el marcador de replay de un evento.
     * Retorna true si el marcador fue adquirido (evento nunca visto o
     * marcador caduco); false si el evento es un duplicado vivo.
     */
    pub async fn acquire_replay_marker(
        &self,
        event_id: &str,
        time_to_live: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, CacheError> {
        let now_ms = now.timestamp_millis();
        let expires_at_ms = now_ms + time_to_live.as_millis() as i64;

        let connection = self.get_connection()?;
        let mut rows = connection
            .query(
                "INSERT INTO replay_markers (marker_key, expires_at_ms) VALUES (?1, ?2) \
                 ON CONFLICT(marker_key) DO UPDATE SET expires_at_ms = excluded.expires_at_ms \
                 WHERE replay_markers.expires_at_ms <= ?3 \
                 RETURNING marker_key",
                params![keyspace::replay_marker(event_id), expires_at_ms, now_ms],
            )
            .await?;

        Ok(rows.next().await?.is_some())
    }

    /// Libera el marcador de replay de un evento cuya persistencia falló,
    /// habilitando el reintento del cliente con el mismo event_id.
    pub async fn release_replay_marker(&self, event_id: &str) -> Result<(), CacheError> {
        let connection = self.get_connection()?;
        connection
            .execute(
                "DELETE FROM replay_markers WHERE marker_key = ?1",
                params![keyspace::replay_marker(event_id)],
            )
            .await?;
        Ok(())
    }

    // --- ESTRATO 2: CONTADORES ATÓMICOS CON TTL ---

    /// Incremento atómico del contador de ráfaga por (sesión, minuto).
    /// El TTL se fija en el primer incremento de la época.
    pub async fn increment_rate_counter(
        &self,
        session_id: &Uuid,
        minute_bucket: i64,
        time_to_live: Duration,
        now: DateTime<Utc>,
    ) -> Result<i64, CacheError> {
        self.bump_counter(
            keyspace::rate_counter(session_id, minute_bucket),
            time_to_live,
            now,
        )
        .await
    }

    /// Lectura del contador vivo de ráfaga (0 si ausente o caduco).
    pub async fn current_rate(
        &self,
        session_id: &Uuid,
        minute_bucket: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CacheError> {
        let connection = self.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT counter_value FROM rate_counters \
                 WHERE counter_key = ?1 AND expires_at_ms > ?2",
                params![
                    keyspace::rate_counter(session_id, minute_bucket),
                    now.timestamp_millis()
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }

    /// Incremento atómico del gate de escalación de alertas. El primer
    /// incremento de cada época de cooldown retorna 1 (emitir alerta).
    pub async fn increment_alert_gate(
        &self,
        session_id: &Uuid,
        kind_code: &str,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Result<i64, CacheError> {
        self.bump_counter(keyspace::alert_gate(session_id, kind_code), cooldown, now)
            .await
    }

    /// Primitiva compartida: increment-with-TTL en UNA sentencia.
    /// Una fila caduca renace en 1 con TTL fresco.
    async fn bump_counter(
        &self,
        counter_key: String,
        time_to_live: Duration,
        now: DateTime<Utc>,
    ) -> Result<i64, CacheError> {
        let now_ms = now.timestamp_millis();
        let expires_at_ms = now_ms + time_to_live.as_millis() as i64;

        let connection = self.get_connection()?;
        let mut rows = connection
            .query(
                "INSERT INTO rate_counters (counter_key, counter_value, expires_at_ms) \
                 VALUES (?1, 1, ?2) \
                 ON CONFLICT(counter_key) DO UPDATE SET \
                   counter_value = CASE WHEN rate_counters.expires_at_ms <= ?3 \
                     THEN 1 ELSE rate_counters.counter_value + 1 END, \
                   expires_at_ms = CASE WHEN rate_counters.expires_at_ms <= ?3 \
                     THEN ?2 ELSE rate_counters.expires_at_ms END \
                 RETURNING counter_value",
                params![counter_key, expires_at_ms, now_ms],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Err(CacheError::ConnectionError("COUNTER_RETURNING_VOID".into())),
        }
    }

    // --- ESTRATO 3: VENTANA DESLIZANTE (sorted set por tiempo) ---

    /**
     * Registra una marca en la ventana deslizante de (sesión, tipo):
     * poda las entradas más viejas que la cota dura, inserta el
     * event_id si está ausente y computa el cardinal de la ventana de
     * evaluación — todo en UNA transacción.
     *
     * La inserción es por event_id: re-evaluar un evento ya visto no
     * infla el conteo (idempotencia del motor dual-path).
     */
    #[instrument(skip(self), level = "debug")]
    pub async fn record_window_event(
        &self,
        session_id: &Uuid,
        kind_code: &str,
        event_id: &str,
        event_time: DateTime<Utc>,
        hard_cap: Duration,
        evaluation_window: Duration,
        time_to_live: Duration,
        now: DateTime<Utc>,
    ) -> Result<WindowObservation, CacheError> {
        let window_key = keyspace::sliding_window(session_id, kind_code);
        let now_ms = now.timestamp_millis();
        let hard_cap_floor_ms = now_ms - hard_cap.as_millis() as i64;
        let evaluation_floor_ms = now_ms - evaluation_window.as_millis() as i64;
        let expires_at_ms = now_ms + time_to_live.as_millis() as i64;

        let connection = self.get_connection()?;
        let transaction = connection.transaction().await?;

        // 1. PODA DURA: descarta marcas fuera de la retención de 10 min.
        transaction
            .execute(
                "DELETE FROM window_entries WHERE window_key = ?1 AND event_time_ms < ?2",
                params![window_key.clone(), hard_cap_floor_ms],
            )
            .await?;

        // 2. INSERCIÓN IDEMPOTENTE por event_id.
        let inserted_rows = transaction
            .execute(
                "INSERT OR IGNORE INTO window_entries \
                 (window_key, member_identifier, event_time_ms, expires_at_ms) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    window_key.clone(),
                    event_id.to_string(),
                    event_time.timestamp_millis(),
                    expires_at_ms
                ],
            )
            .await?;

        // 3. CARDINAL de la ventana de evaluación (5 min).
        let mut count_rows = transaction
            .query(
                "SELECT COUNT(*) FROM window_entries \
                 WHERE window_key = ?1 AND event_time_ms >= ?2",
                params![window_key, evaluation_floor_ms],
            )
            .await?;

        let evaluation_count = match count_rows.next().await? {
            Some(row) => row.get::<i64>(0)? as u64,
            None => 0,
        };

        transaction.commit().await?;

        Ok(WindowObservation {
            freshly_inserted: inserted_rows > 0,
            evaluation_count,
        })
    }

    // --- ESTRATO 4: HIGIENE FÍSICA (janitor) ---

    /// Purga física de filas caducas en todas las tablas del estrato.
    /// La corrección no depende de esta purga (expiración perezosa).
    #[instrument(skip(self))]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, CacheError> {
        let now_ms = now.timestamp_millis();
        let connection = self.get_connection()?;

        let mut purged_total = 0u64;
        for table_name in ["replay_markers", "rate_counters", "window_entries"] {
            purged_total += connection
                .execute(
                    &format!("DELETE FROM {table_name} WHERE expires_at_ms <= ?1"),
                    params![now_ms],
                )
                .await?;
        }

        if purged_total > 0 {
            info!("💀 [CACHE_JANITOR]: Evicted {} expired tactical rows.", purged_total);
        }

        Ok(purged_total)
    }
}
