// [libs/infra/db-turso/src/schema.rs]
/**
 * =================================================================
 * APARATO: SOVEREIGN LEDGER SCHEMA (V9.0 - PROCTORING STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. IDENTITY UNIQUENESS: Índice único sobre la tupla de identidad
 *    (tenant, schedule, user, attempt) y sobre event_id — la segunda
 *    línea de defensa de la admisión.
 * 2. IDEMPOTENCIA: Gestión de errores para migraciones en caliente.
 * 3. PERFORMANCE: Índices de aceleración para el escaneo por
 *    (session_id, created_at) de alertas, eventos y evidencia.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del pipeline de proctoring.
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            exam_schedule_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            attempt_no INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            started_at TEXT NOT NULL,
            ended_at TEXT,
            last_heartbeat_at TEXT NOT NULL,
            current_risk_score REAL NOT NULL DEFAULT 0,
            UNIQUE(tenant_id, exam_schedule_id, user_id, attempt_no)
        );
    "#),
    ("TABLE_ANOMALY_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS anomaly_events (
            event_id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            event_time TEXT NOT NULL,
            severity TEXT NOT NULL,
            confidence REAL,
            details TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );
    "#),
    ("TABLE_ALERTS", r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            alert_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            created_at TEXT NOT NULL,
            triggering_event_id TEXT,
            details TEXT NOT NULL DEFAULT '{}'
        );
    "#),
    ("TABLE_EVIDENCE", r#"
        CREATE TABLE IF NOT EXISTS evidence (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            byte_size INTEGER NOT NULL,
            sha256_digest TEXT NOT NULL,
            mime_type TEXT NOT NULL DEFAULT 'image/jpeg',
            created_at TEXT NOT NULL,
            storage_locator TEXT NOT NULL
        );
    "#),
    ("TABLE_RISK_SNAPSHOTS", r#"
        CREATE TABLE IF NOT EXISTS risk_snapshots (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            score REAL NOT NULL,
            created_at TEXT NOT NULL,
            details TEXT NOT NULL DEFAULT '{}'
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que las tablas existentes se adapten a las nuevas capacidades.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    // --- CAPTURA DE CONFIGURACIÓN POR SESIÓN ---
    ("SESSION_CONFIG", "ALTER TABLE sessions ADD COLUMN config_snapshot TEXT NOT NULL DEFAULT '{}'"),

    // --- ENLACE EVENTO <-> EVIDENCIA (uno-a-uno, post-ingesta) ---
    ("EVENT_EVIDENCE", "ALTER TABLE anomaly_events ADD COLUMN evidence_id TEXT"),
    ("ALERT_EVIDENCE", "ALTER TABLE alerts ADD COLUMN evidence_id TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza el escaneo indexado por (session_id, created_at).
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_EVENTS_SESSION", "CREATE INDEX IF NOT EXISTS idx_events_session ON anomaly_events(session_id, created_at);"),
    ("IDX_ALERTS_SESSION", "CREATE INDEX IF NOT EXISTS idx_alerts_session ON alerts(session_id, created_at);"),
    ("IDX_EVIDENCE_SESSION", "CREATE INDEX IF NOT EXISTS idx_evidence_session ON evidence(session_id, created_at);"),
    ("IDX_SNAPSHOTS_SESSION", "CREATE INDEX IF NOT EXISTS idx_snapshots_session ON risk_snapshots(session_id, created_at);"),
    ("IDX_SESSIONS_SWEEP", "CREATE INDEX IF NOT EXISTS idx_sessions_sweep ON sessions(status, last_heartbeat_at);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_ledger_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V9.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Proctoring Ledger V9.0 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => debug!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(repair_fault) => {
                let message = repair_fault.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
