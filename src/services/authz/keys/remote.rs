//! Remote JWK set: fetch the set, pick the key matching the token's `kid`.
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey,
    jwk::{Jwk, JwkSet, PublicKeyUse},
};
use moka::future::Cache;
use reqwest::Client;
use url::Url;

use super::{KeyError, ResolvedKey, unverified_header};

/// Source of JWK sets.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait JwkSetFetcher: Send + Sync + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyError>;

    // Drop any cached copy of `url`. Returns true if a later fetch may see a newer set.
    async fn invalidate(&self, _url: &Url) -> bool {
        false
    }
}

/// Plain HTTP fetcher. The client timeout bounds every request.
#[derive(Clone, Debug)]
pub struct HttpJwkSetFetcher {
    client: Client,
}

impl HttpJwkSetFetcher {
    pub fn new(timeout: Duration) -> Result<Self, KeyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JwkSetFetcher for HttpJwkSetFetcher {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyError> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(KeyError::FetchStatus(response.status()));
        }

        Ok(response.json::<JwkSet>().await?)
    }
}

/// TTL cache in front of another fetcher, keyed by URL.
///
/// A forced refresh (kid miss) is allowed at most once per `refresh_cooldown` for each URL;
/// inside the cooldown the cached set stands and unknown kids fail without an upstream fetch.
pub struct CachedJwkSetFetcher<F> {
    inner: Arc<F>,
    cache: Cache<Url, JwkSet>,
    // Presence of a URL means it was force-refreshed within the cooldown.
    refreshed: Cache<Url, ()>,
}

impl<F: JwkSetFetcher> CachedJwkSetFetcher<F> {
    pub fn new(inner: F, time_to_live: Duration, refresh_cooldown: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(time_to_live)
            .build();

        let refreshed = Cache::builder()
            .max_capacity(16)
            .time_to_live(refresh_cooldown)
            .build();

        Self {
            inner: Arc::new(inner),
            cache,
            refreshed,
        }
    }
}

#[async_trait]
impl<F: JwkSetFetcher> JwkSetFetcher for CachedJwkSetFetcher<F> {
    fn backend_name(&self) -> &'static str {
        "moka"
    }

    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyError> {
        // Concurrent misses for the same URL share a single upstream fetch.
        self.cache
            .try_get_with(url.clone(), self.inner.fetch(url))
            .await
            .map_err(KeyError::Cached)
    }

    async fn invalidate(&self, url: &Url) -> bool {
        // Only the caller that inserts the marker gets to refresh.
        let marker = self.refreshed.entry(url.clone()).or_insert(()).await;
        if !marker.is_fresh() {
            tracing::debug!(url = %url, "JWK set refresh skipped, cooldown active");
            return false;
        }

        self.cache.invalidate(url).await;
        true
    }
}

/// Resolve the key for `token` from the JWK set at `url`.
pub async fn load(
    fetcher: &dyn JwkSetFetcher,
    url: &Url,
    token: &str,
) -> Result<ResolvedKey, KeyError> {
    let header = unverified_header(token)?;
    let kid = header.kid.ok_or(KeyError::MissingKid)?;

    let jwk = match find(fetcher, url, &kid).await? {
        Some(jwk) => jwk,
        None => {
            if !fetcher.invalidate(url).await {
                return Err(KeyError::UnknownKid(kid));
            }
            // Key may have been rotated since the set was cached.
            tracing::info!(kid = %kid, "kid not in cached JWK set, refetching");
            find(fetcher, url, &kid)
                .await?
                .ok_or_else(|| KeyError::UnknownKid(kid.clone()))?
        }
    };

    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return Err(KeyError::NotASigningKey(kid));
    }

    if let Some(key_algorithm) = jwk.common.key_algorithm {
        let key = key_algorithm.to_string();
        if key.parse::<Algorithm>().ok() != Some(header.alg) {
            return Err(KeyError::AlgorithmMismatch {
                token: header.alg,
                key,
            });
        }
    }

    let key = DecodingKey::from_jwk(&jwk).map_err(KeyError::InvalidKey)?;

    Ok(ResolvedKey {
        key,
        algorithm: header.alg,
    })
}

async fn find(fetcher: &dyn JwkSetFetcher, url: &Url, kid: &str) -> Result<Option<Jwk>, KeyError> {
    Ok(fetcher.fetch(url).await?.find(kid).cloned())
}
