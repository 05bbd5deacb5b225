// [libs/infra/blobstore/src/lib.rs]
/*!
 * =================================================================
 * APARATO: EVIDENCE BLOB VAULT (V4.0 - CONTENT ADDRESSED)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ESCRITURA/LECTURA DE BLOBS POR LOCALIZADOR OPACO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPAQUE LOCATORS: El consumidor solo ve 'put(bytes) -> locator' y
 *    'get(locator) -> bytes'; el respaldo (filesystem local u object
 *    store) jamás se filtra por la interfaz.
 * 2. PATH SHIELD: Los localizadores con segmentos '..' se rechazan
 *    antes de tocar el disco.
 * 3. DIGEST PARITY: Comparación de digests SHA-256 en tiempo constante.
 * =================================================================
 */

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum VaultError {
    /// Fallo físico de disco en la bóveda.
    #[error("[L3_VAULT_IO_FAULT]: BLOB_STORAGE_FAILURE -> {0}")]
    IoError(#[from] std::io::Error),

    /// Localizador malformado o con intento de path traversal.
    #[error("[L3_VAULT_SHIELD]: LOCATOR_REJECTED -> {0}")]
    InvalidLocator(String),
}

/// Bóveda de evidencia con respaldo de filesystem local.
/// Los localizadores siguen el formato '{session_id}/thumb-{event_id}.jpg'.
#[derive(Debug, Clone)]
pub struct EvidenceVault {
    vault_root_path: PathBuf,
}

impl EvidenceVault {
    pub fn open(vault_root_path: impl Into<PathBuf>) -> Self {
        Self { vault_root_path: vault_root_path.into() }
    }

    /**
     * Cristaliza los bytes de una miniatura y retorna su localizador opaco.
     */
    #[instrument(skip(self, blob_bytes), fields(bytes = blob_bytes.len()))]
    pub async fn put(
        &self,
        session_id: &Uuid,
        event_id: &str,
        blob_bytes: &[u8],
    ) -> Result<String, VaultError> {
        let sanitized_event_id = sanitize_locator_segment(event_id)?;
        let locator = format!("{session_id}/thumb-{sanitized_event_id}.jpg");

        let physical_path = self.resolve_physical_path(&locator)?;
        if let Some(parent_directory) = physical_path.parent() {
            fs::create_dir_all(parent_directory).await?;
        }

        fs::write(&physical_path, blob_bytes).await?;
        debug!("💾 [EVIDENCE_VAULT]: Blob crystallized at locator [{}].", locator);

        Ok(locator)
    }

    /// Recupera los bytes de un blob por su localizador opaco.
    pub async fn get(&self, locator: &str) -> Result<Vec<u8>, VaultError> {
        let physical_path = self.resolve_physical_path(locator)?;
        Ok(fs::read(&physical_path).await?)
    }

    /// Traduce el localizador opaco a ruta física, con escudo de traversal.
    fn resolve_physical_path(&self, locator: &str) -> Result<PathBuf, VaultError> {
        if locator.is_empty()
            || Path::new(locator).is_absolute()
            || locator.split(['/', '\\']).any(|segment| segment == "..")
        {
            return Err(VaultError::InvalidLocator(locator.to_string()));
        }
        Ok(self.vault_root_path.join(locator))
    }
}

/// Computa el digest SHA-256 hexadecimal de un blob.
pub fn compute_sha256_digest(blob_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(blob_bytes);
    hex::encode(hasher.finalize())
}

/// Compara dos digests hexadecimales en tiempo constante respecto al
/// contenido (el largo de un digest SHA-256 es público).
pub fn digests_match(left_digest: &str, right_digest: &str) -> bool {
    let left_bytes = left_digest.as_bytes();
    let right_bytes = right_digest.as_bytes();

    if left_bytes.len() != right_bytes.len() {
        return false;
    }

    let mut accumulated_difference = 0u8;
    for (left_byte, right_byte) in left_bytes.iter().zip(right_bytes.iter()) {
        accumulated_difference |= left_byte ^ right_byte;
    }
    accumulated_difference == 0
}

/// Rechaza separadores y navegación en segmentos provistos por el cliente.
fn sanitize_locator_segment(segment: &str) -> Result<&str, VaultError> {
    if segment.is_empty() || segment.contains(['/', '\\']) || segment.contains("..") {
        return Err(VaultError::InvalidLocator(segment.to_string()));
    }
    Ok(segment)
}
