// [libs/infra/credentials/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL VERIFICATION AUTHORITY (V8.0 - RS256 GALVANIC)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: VERIFICACIÓN ASIMÉTRICA Y EXTRACCIÓN DE CLAIMS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. KEY ROTATION READY: Fuente de llave configurable — PEM estático o
 *    keyset por key-id ({kid}.pem), resuelto por el header del token.
 * 2. STATELESS REFRESH: Un token fresco con la misma tupla de identidad
 *    es transparente; la verificación es por petición, sin estado.
 * 3. BOOTSTRAP LOADING: El material de llave se carga UNA vez en la
 *    ignición del proceso; el hot path solo computa la firma.
 * 4. DEV FORGE QUARANTINE: La forja de tokens vive aquí pero solo los
 *    perfiles de despliegue local/docker la exponen por HTTP.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use vigil_domain_models::claims::ExamClaims;
use vigil_domain_models::session::ExamIdentityTuple;

#[derive(Error, Debug)]
pub enum CredentialError {
    /// El material de llave pública no pudo cargarse en la ignición.
    #[error("[L4_CRED_FAULT]: KEY_MATERIAL_UNAVAILABLE -> {0}")]
    KeyMaterialUnavailable(String),

    /// El token no es un JWT bien formado.
    #[error("[L4_CRED_FAULT]: MALFORMED_TOKEN")]
    MalformedToken,

    /// La firma no corresponde al material de llave configurado.
    #[error("[L4_CRED_FAULT]: SIGNATURE_INVALID")]
    SignatureInvalid,

    /// La credencial expiró (claim 'exp').
    #[error("[L4_CRED_FAULT]: CREDENTIAL_EXPIRED")]
    Expired,

    /// Faltan claims de identidad requeridas o tienen tipo inválido.
    #[error("[L4_CRED_FAULT]: REQUIRED_CLAIMS_MISSING -> {0}")]
    MissingClaims(String),

    /// El header referencia un key-id ausente del keyset.
    #[error("[L4_CRED_FAULT]: UNKNOWN_KEY_ID -> {0}")]
    UnknownKeyId(String),
}

/// Fuente configurable del material de llave pública del emisor.
#[derive(Debug, Clone)]
pub enum CredentialKeySource {
    /// Un único PEM de llave pública RSA.
    StaticPem(PathBuf),
    /// Directorio de keyset rotativo: un archivo '{kid}.pem' por llave.
    KeysetDirectory(PathBuf),
}

/// Autoridad de verificación de credenciales portadoras (singleton de proceso).
pub struct CredentialVerifier {
    static_decoding_key: Option<DecodingKey>,
    rotating_keyset: HashMap<String, DecodingKey>,
    validation: Validation,
}

impl CredentialVerifier {
    /**
     * Carga el material de llave y sella la política de validación.
     * Se invoca UNA vez durante la ignición del proceso.
     */
    #[instrument(skip_all)]
    pub fn from_source(key_source: &CredentialKeySource) -> Result<Self, CredentialError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp"]);

        match key_source {
            CredentialKeySource::StaticPem(pem_path) => {
                let decoding_key = load_public_key(pem_path)?;
                info!("🔑 [CREDENTIALS]: Static issuer key loaded from [{}].", pem_path.display());

                Ok(Self {
                    static_decoding_key: Some(decoding_key),
                    rotating_keyset: HashMap::new(),
                    validation,
                })
            }
            CredentialKeySource::KeysetDirectory(keyset_directory) => {
                let mut rotating_keyset = HashMap::new();

                let directory_entries = std::fs::read_dir(keyset_directory).map_err(|io_fault| {
                    CredentialError::KeyMaterialUnavailable(format!(
                        "KEYSET_DIR_UNREADABLE [{}]: {io_fault}",
                        keyset_directory.display()
                    ))
                })?;

                for entry in directory_entries.flatten() {
                    let entry_path = entry.path();
                    let is_pem = entry_path.extension().map(|ext| ext == "pem").unwrap_or(false);
                    if !is_pem {
                        continue;
                    }

                    let key_identifier = entry_path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .unwrap_or_default()
                        .to_string();

                    rotating_keyset.insert(key_identifier.clone(), load_public_key(&entry_path)?);
                    debug!("🔑 [CREDENTIALS]: Keyset member [{}] registered.", key_identifier);
                }

                if rotating_keyset.is_empty() {
                    return Err(CredentialError::KeyMaterialUnavailable(format!(
                        "KEYSET_EMPTY [{}]",
                        keyset_directory.display()
                    )));
                }

                info!("🔑 [CREDENTIALS]: Rotating keyset loaded ({} keys).", rotating_keyset.len());
                Ok(Self {
                    static_decoding_key: None,
                    rotating_keyset,
                    validation,
                })
            }
        }
    }

    /**
     * Verifica la firma RS256 y extrae las claims de identidad.
     *
     * # Errors:
     * Retorna la variante semántica exacta; el gateway las colapsa en
     * 'credential_invalid' (401) sin filtrar detalle al cliente.
     */
    pub fn verify(&self, bearer_token: &str) -> Result<ExamClaims, CredentialError> {
        let token_header = decode_header(bearer_token).map_err(|_| CredentialError::MalformedToken)?;

        let decoding_key = match (&token_header.kid, &self.static_decoding_key) {
            // El keyset rotativo se resuelve por el key-id del header.
            (Some(key_identifier), _) if !self.rotating_keyset.is_empty() => self
                .rotating_keyset
                .get(key_identifier)
                .ok_or_else(|| CredentialError::UnknownKeyId(key_identifier.clone()))?,
            (_, Some(static_key)) => static_key,
            (None, None) => {
                return Err(CredentialError::KeyMaterialUnavailable(
                    "NO_KEY_FOR_UNKEYED_TOKEN".into(),
                ))
            }
            (Some(_), None) => {
                return Err(CredentialError::KeyMaterialUnavailable(
                    "KEYSET_VOID_FOR_KEYED_TOKEN".into(),
                ))
            }
        };

        let token_data = decode::<ExamClaims>(bearer_token, decoding_key, &self.validation)
            .map_err(classify_verification_fault)?;

        Ok(token_data.claims)
    }
}

/// Traduce los fallos del motor JWT a variantes semánticas del catálogo.
fn classify_verification_fault(verification_fault: jsonwebtoken::errors::Error) -> CredentialError {
    use jsonwebtoken::errors::ErrorKind;

    match verification_fault.kind() {
        ErrorKind::ExpiredSignature => CredentialError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidRsaKey(_) => CredentialError::SignatureInvalid,
        ErrorKind::Json(decode_fault) => CredentialError::MissingClaims(decode_fault.to_string()),
        ErrorKind::MissingRequiredClaim(claim_name) => {
            CredentialError::MissingClaims(claim_name.clone())
        }
        other_kind => {
            warn!("❌ [CREDENTIALS]: Verification rejected: {:?}", other_kind);
            CredentialError::MalformedToken
        }
    }
}

fn load_public_key(pem_path: &Path) -> Result<DecodingKey, CredentialError> {
    let pem_bytes = std::fs::read(pem_path).map_err(|io_fault| {
        CredentialError::KeyMaterialUnavailable(format!(
            "PEM_UNREADABLE [{}]: {io_fault}",
            pem_path.display()
        ))
    })?;

    DecodingKey::from_rsa_pem(&pem_bytes).map_err(|parse_fault| {
        CredentialError::KeyMaterialUnavailable(format!(
            "PEM_REJECTED [{}]: {parse_fault}",
            pem_path.display()
        ))
    })
}

// =================================================================
// FORJA DE DESARROLLO (NUNCA expuesta fuera de local/docker)
// =================================================================

/// Forja de credenciales de desarrollo. El gateway solo monta su
/// endpoint en los perfiles de despliegue 'local' y 'docker'.
pub struct DevelopmentCredentialForge {
    signing_key: EncodingKey,
    key_identifier: Option<String>,
}

impl DevelopmentCredentialForge {
    pub fn from_pem_file(
        signing_pem_path: &Path,
        key_identifier: Option<String>,
    ) -> Result<Self, CredentialError> {
        let pem_bytes = std::fs::read(signing_pem_path).map_err(|io_fault| {
            CredentialError::KeyMaterialUnavailable(format!(
                "SIGNING_PEM_UNREADABLE [{}]: {io_fault}",
                signing_pem_path.display()
            ))
        })?;

        let signing_key = EncodingKey::from_rsa_pem(&pem_bytes).map_err(|parse_fault| {
            CredentialError::KeyMaterialUnavailable(format!(
                "SIGNING_PEM_REJECTED [{}]: {parse_fault}",
                signing_pem_path.display()
            ))
        })?;

        Ok(Self { signing_key, key_identifier })
    }

    /// Emite un token RS256 con las cuatro claims de identidad.
    pub fn issue(
        &self,
        identity: &ExamIdentityTuple,
        time_to_live: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let claims = ExamClaims {
            tenant_id: identity.tenant_id.clone(),
            exam_schedule_id: identity.exam_schedule_id.clone(),
            user_id: identity.user_id.clone(),
            attempt_no: identity.attempt_no,
            exp: (now + chrono::Duration::seconds(time_to_live.as_secs() as i64)).timestamp(),
            iat: Some(now.timestamp()),
        };

        let mut token_header = Header::new(Algorithm::RS256);
        token_header.kid = self.key_identifier.clone();

        encode(&token_header, &claims, &self.signing_key)
            .map_err(|_| CredentialError::SignatureInvalid)
    }
}
