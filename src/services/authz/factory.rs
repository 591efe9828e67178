/// Factory: build the `AuthorizationGate` from application `Config`.
use std::sync::Arc;

use crate::config::Config;

use super::{
    AuthorizationGate, KeyError, KeyResolver, TokenVerifier,
    keys::{CachedJwkSetFetcher, HttpJwkSetFetcher, JwkSetFetcher},
};

pub fn build_gate(config: &Config) -> Result<Arc<AuthorizationGate>, KeyError> {
    let http = HttpJwkSetFetcher::new(config.jwks_timeout)?;

    let fetcher: Arc<dyn JwkSetFetcher> = match config.jwks_cache_ttl {
        Some(ttl) => Arc::new(CachedJwkSetFetcher::new(
            http,
            ttl,
            config.jwks_refresh_cooldown,
        )),
        None => Arc::new(http),
    };

    let gate = AuthorizationGate::new(
        config.authz.clone(),
        KeyResolver::new(fetcher),
        TokenVerifier::new(config.token_leeway_seconds),
    );

    Ok(Arc::new(gate))
}
