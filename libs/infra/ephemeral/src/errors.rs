// [libs/infra/ephemeral/src/errors.rs]
/*!
 * APARATO: TACTICAL CACHE ERROR CATALOG
 * RESPONSABILIDAD: Catalogación semántica de fallos del estrato efímero.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Error de enlace con el motor de la caché táctica.
    #[error("[L3_CACHE_NET_FAULT]: CACHE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Configuración de entorno vacía o malformada.
    #[error("[L3_CACHE_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de ejecución devuelto por el motor libSQL.
    #[error("[L3_CACHE_QUERY_FAULT]: CACHE_OPERATION_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),
}
