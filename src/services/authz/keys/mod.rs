//! Signing-key resolution.
//!
//! A key source is either a remote JWK set (selected by the token's `kid`) or a single key
//! read from a local file. Both strategies read the *unverified* token header only to pick the
//! key and algorithm; nothing here trusts the token's contents.

pub mod fixed;
pub mod remote;

use std::{path::PathBuf, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;
use url::Url;

pub use remote::{CachedJwkSetFetcher, HttpJwkSetFetcher, JwkSetFetcher};

/// Where the verification key comes from. Decided once when the configuration is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Remote(Url),
    Fixed(PathBuf),
}

/// Key plus the single algorithm the token may be verified with.
///
/// Built per request and dropped after verification. Key material is not printable.
#[derive(Clone)]
pub struct ResolvedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("token header could not be parsed: {0}")]
    Header(#[source] jsonwebtoken::errors::Error),

    #[error("token header has no kid")]
    MissingKid,

    #[error("no key in the JWK set matches kid '{0}'")]
    UnknownKid(String),

    #[error("JWK '{0}' is not a signature key")]
    NotASigningKey(String),

    #[error("token alg {token:?} does not match key alg {key}")]
    AlgorithmMismatch { token: Algorithm, key: String },

    #[error("failed to fetch JWK set: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("JWK set endpoint responded with {0}")]
    FetchStatus(reqwest::StatusCode),

    #[error("{0}")]
    Cached(Arc<KeyError>),

    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing PEM key material as an HMAC secret")]
    PemAsHmacSecret,

    #[error("invalid key material: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
}

/// Dispatches a [`KeySource`] to the matching strategy.
#[derive(Clone)]
pub struct KeyResolver {
    fetcher: Arc<dyn JwkSetFetcher>,
}

impl KeyResolver {
    pub fn new(fetcher: Arc<dyn JwkSetFetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve the key for `token`. Failures are logged here; the caller only sees the error.
    pub async fn resolve(&self, source: &KeySource, token: &str) -> Result<ResolvedKey, KeyError> {
        let result = match source {
            KeySource::Remote(url) => remote::load(self.fetcher.as_ref(), url, token).await,
            KeySource::Fixed(path) => fixed::load(path, token).await,
        };

        match &result {
            Ok(resolved) => {
                tracing::debug!(algorithm = ?resolved.algorithm, "signing key resolved");
            }
            Err(err) => {
                tracing::error!(error = %err, source = ?source, "signing key not resolved");
            }
        }

        result
    }
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("fetcher", &self.fetcher.backend_name())
            .finish()
    }
}

/// Read the unverified header. Only `alg` and `kid` are used from it.
pub(crate) fn unverified_header(token: &str) -> Result<jsonwebtoken::Header, KeyError> {
    jsonwebtoken::decode_header(token).map_err(KeyError::Header)
}
