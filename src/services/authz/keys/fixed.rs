//! Fixed key read from a local file.
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey};

use super::{KeyError, ResolvedKey, unverified_header};

/// Read the key at `path` and pair it with the algorithm from the token header.
///
/// The file is parsed according to the algorithm family:
/// - `HS*`: the raw file bytes are the shared secret
/// - `RS*` / `PS*`: RSA public key PEM
/// - `ES*`: EC public key PEM
/// - `EdDSA`: Ed25519 public key PEM
pub async fn load(path: &Path, token: &str) -> Result<ResolvedKey, KeyError> {
    let material = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| KeyError::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;

    let header = unverified_header(token)?;
    let key = decoding_key(header.alg, &material)?;

    Ok(ResolvedKey {
        key,
        algorithm: header.alg,
    })
}

fn decoding_key(algorithm: Algorithm, material: &str) -> Result<DecodingKey, KeyError> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            // A public key used as an HMAC secret lets anyone forge tokens.
            if material.trim_start().starts_with("-----BEGIN") {
                return Err(KeyError::PemAsHmacSecret);
            }
            Ok(DecodingKey::from_secret(material.as_bytes()))
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => {
            DecodingKey::from_rsa_pem(material.as_bytes()).map_err(KeyError::InvalidKey)
        }
        Algorithm::ES256 | Algorithm::ES384 => {
            DecodingKey::from_ec_pem(material.as_bytes()).map_err(KeyError::InvalidKey)
        }
        Algorithm::EdDSA => {
            DecodingKey::from_ed_pem(material.as_bytes()).map_err(KeyError::InvalidKey)
        }
    }
}
