//! Fixtures shared by the authz unit tests: keys from `tests/resources`, token minting and
//! an in-memory JWK set source.
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, jwk::JwkSet};
use serde_json::{Value, json};
use url::Url;

use super::keys::{JwkSetFetcher, KeyError, ResolvedKey};

pub const AUDIENCE: &str = "https://treasure";
pub const ISSUER: &str = "https://pyrates";
pub const RSA_KID: &str = "5b889a22-6e44-45f7-8f5e-537db1d9b16e";
pub const ED25519_KID: &str = "c0ffee-ed25519";
pub const HMAC_SECRET: &str = "shiver-me-timbers";

const RSA_PRIVATE_PEM: &[u8] = include_bytes!("../../../tests/resources/private.pem");
const RSA_PRIVATE_B_PEM: &[u8] = include_bytes!("../../../tests/resources/private_b.pem");
const RSA_PUBLIC_PEM: &[u8] = include_bytes!("../../../tests/resources/public.pem");
const ED25519_PRIVATE_PEM: &[u8] = include_bytes!("../../../tests/resources/ed25519_private.pem");
const JWKS_JSON: &str = include_str!("../../../tests/resources/jwks.json");

pub fn resource_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join(name)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims() -> Value {
    claims_with_scopes(&["treasure:read"])
}

pub fn claims_with_scopes(scopes: &[&str]) -> Value {
    let now = now();
    json!({
        "aud": AUDIENCE,
        "iss": ISSUER,
        "sub": "1234567890",
        "iat": now,
        "exp": now + 20 * 60,
        "scopes": scopes,
    })
}

pub fn expired_claims() -> Value {
    let mut claims = claims();
    claims["exp"] = json!(now() - 20 * 60);
    claims
}

fn sign(algorithm: Algorithm, key: &EncodingKey, claims: &Value, kid: Option<&str>) -> String {
    let mut header = Header::new(algorithm);
    header.kid = kid.map(str::to_string);
    jsonwebtoken::encode(&header, claims, key).unwrap()
}

pub fn rs256_token(claims: &Value, kid: Option<&str>) -> String {
    let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM).unwrap();
    sign(Algorithm::RS256, &key, claims, kid)
}

pub fn rs256_token_from_other_key(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_B_PEM).unwrap();
    sign(Algorithm::RS256, &key, claims, Some(RSA_KID))
}

pub fn ed25519_token(claims: &Value, kid: Option<&str>) -> String {
    let key = EncodingKey::from_ed_pem(ED25519_PRIVATE_PEM).unwrap();
    sign(Algorithm::EdDSA, &key, claims, kid)
}

pub fn hs256_token(claims: &Value) -> String {
    let key = EncodingKey::from_secret(HMAC_SECRET.as_bytes());
    sign(Algorithm::HS256, &key, claims, None)
}

pub fn hs256_token_with_kid(claims: &Value, kid: &str) -> String {
    let key = EncodingKey::from_secret(HMAC_SECRET.as_bytes());
    sign(Algorithm::HS256, &key, claims, Some(kid))
}

pub fn rsa_key() -> ResolvedKey {
    ResolvedKey {
        key: DecodingKey::from_rsa_pem(RSA_PUBLIC_PEM).unwrap(),
        algorithm: Algorithm::RS256,
    }
}

/// Serves `tests/resources/jwks.json` and counts fetches.
pub struct StaticJwkSetFetcher {
    pub set: JwkSet,
    pub calls: Arc<AtomicUsize>,
}

impl StaticJwkSetFetcher {
    pub fn from_resources() -> Self {
        Self::with_set(serde_json::from_str(JWKS_JSON).unwrap())
    }

    pub fn with_set(set: JwkSet) -> Self {
        Self {
            set,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl JwkSetFetcher for StaticJwkSetFetcher {
    fn backend_name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, _url: &Url) -> Result<JwkSet, KeyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.set.clone())
    }
}

/// Always fails, as an unreachable key-set endpoint would.
pub struct UnreachableJwkSetFetcher;

#[async_trait]
impl JwkSetFetcher for UnreachableJwkSetFetcher {
    fn backend_name(&self) -> &'static str {
        "unreachable"
    }

    async fn fetch(&self, _url: &Url) -> Result<JwkSet, KeyError> {
        Err(KeyError::FetchStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}

/// Fails the first `failures` fetches, then serves `tests/resources/jwks.json`.
pub struct FlakyJwkSetFetcher {
    inner: StaticJwkSetFetcher,
    failures: usize,
    pub calls: Arc<AtomicUsize>,
}

impl FlakyJwkSetFetcher {
    pub fn failing_first(failures: usize) -> Self {
        let inner = StaticJwkSetFetcher::from_resources();
        let calls = inner.calls.clone();
        Self {
            inner,
            failures,
            calls,
        }
    }
}

#[async_trait]
impl JwkSetFetcher for FlakyJwkSetFetcher {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyError> {
        if self.calls.load(Ordering::SeqCst) < self.failures {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Err(KeyError::FetchStatus(reqwest::StatusCode::BAD_GATEWAY));
        }
        self.inner.fetch(url).await
    }
}
