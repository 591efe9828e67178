use axum::http::HeaderMap;

use crate::config::{AuthzConfig, AuthzConfigError, AuthzPolicy};
use crate::error::AppError;

use super::{bearer, keys::KeyResolver, verifier::Claims, verifier::TokenVerifier};

/// Outcome of [`AuthorizationGate::authorize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Authorization is not configured; the request proceeds without claims.
    NotRequired,
    Allowed(Claims),
    /// Always one of `BadConfiguration`, `BadRequest` (400) or `AccessDenied` (403).
    Denied(AppError),
}

/// Decides whether a request carrying a bearer token may proceed.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. audience/issuer configured, else 400
/// 2. bearer token present, else 400
/// 3. exactly one key source configured, else 400
/// 4. key resolved, else 403
/// 5. token verified with all required scopes, else 403
#[derive(Debug)]
pub struct AuthorizationGate {
    config: AuthzConfig,
    resolver: KeyResolver,
    verifier: TokenVerifier,
}

impl AuthorizationGate {
    pub fn new(config: AuthzConfig, resolver: KeyResolver, verifier: TokenVerifier) -> Self {
        Self {
            config,
            resolver,
            verifier,
        }
    }

    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    pub async fn authorize(&self, headers: &HeaderMap) -> Decision {
        let policy = match &self.config {
            AuthzConfig::Disabled => return Decision::NotRequired,
            AuthzConfig::Enabled(policy) => Ok(policy),
            AuthzConfig::Invalid(err) => Err(err),
        };

        match self.run(policy, headers).await {
            Ok(claims) => Decision::Allowed(claims),
            Err(err) => Decision::Denied(err),
        }
    }

    async fn run(
        &self,
        policy: Result<&AuthzPolicy, &AuthzConfigError>,
        headers: &HeaderMap,
    ) -> Result<Claims, AppError> {
        if let Err(err @ AuthzConfigError::MissingAudienceOrIssuer) = policy {
            tracing::error!(error = %err, "bad configuration");
            return Err(AppError::BadConfiguration);
        }

        let token = bearer::extract(headers).ok_or_else(|| {
            tracing::error!("missing bearer token");
            AppError::BadRequest
        })?;

        let policy = policy.map_err(|err| {
            tracing::error!(error = %err, "bad configuration");
            AppError::BadConfiguration
        })?;

        // Resolution failures are logged by the resolver.
        let key = self
            .resolver
            .resolve(&policy.key_source, token)
            .await
            .map_err(|_| AppError::AccessDenied)?;

        let claims = self
            .verifier
            .verify(
                token,
                &key,
                &policy.audience,
                &policy.issuer,
                &policy.required_scopes,
            )
            .map_err(|_| AppError::AccessDenied)?;

        tracing::info!(sub = ?claims.get("sub"), "request authorized");
        Ok(claims)
    }
}
