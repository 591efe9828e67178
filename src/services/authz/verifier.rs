use jsonwebtoken::Validation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::keys::ResolvedKey;

/// Verified token claims, kept exactly as they were in the token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(pub Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `scopes` claim. `None` if it is absent or not a list; non-string entries are skipped.
    pub fn scopes(&self) -> Option<Vec<&str>> {
        match self.0.get("scopes")? {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token not decoded: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token has no 'scopes' list")]
    MissingScopes,

    #[error("token lacks required scopes: {}", .0.join(", "))]
    InsufficientScope(Vec<String>),
}

/// Signature, standard-claim and scope verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenVerifier {
    leeway_seconds: u64,
}

impl TokenVerifier {
    pub fn new(leeway_seconds: u64) -> Self {
        Self { leeway_seconds }
    }

    /// Verify `token` against `key` and check it grants every scope in `required_scopes`.
    ///
    /// `jsonwebtoken::Validation` checks:
    /// - signature, with `key.algorithm` as the only accepted algorithm
    /// - `exp` (and `nbf` when present), with the configured leeway
    /// - `aud` and `iss`, which must be present and equal the expected values
    ///
    /// The scope check is set containment; order and extra scopes do not matter.
    pub fn verify(
        &self,
        token: &str,
        key: &ResolvedKey,
        audience: &str,
        issuer: &str,
        required_scopes: &[String],
    ) -> Result<Claims, VerifyError> {
        let result = self.decode(token, key, audience, issuer).and_then(|claims| {
            check_scopes(&claims, required_scopes)?;
            Ok(claims)
        });

        match &result {
            Ok(_) => tracing::debug!("token verified"),
            Err(err @ VerifyError::Jwt(_)) => tracing::error!(error = %err, "token rejected"),
            Err(err) => tracing::info!(error = %err, "token lacks required scopes"),
        }

        result
    }

    fn decode(
        &self,
        token: &str,
        key: &ResolvedKey,
        audience: &str,
        issuer: &str,
    ) -> Result<Claims, VerifyError> {
        let mut validation = Validation::new(key.algorithm);
        validation.set_audience(&[audience]);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway_seconds;

        let data = jsonwebtoken::decode::<Claims>(token, &key.key, &validation)?;
        Ok(data.claims)
    }
}

fn check_scopes(claims: &Claims, required_scopes: &[String]) -> Result<(), VerifyError> {
    if required_scopes.is_empty() {
        return Ok(());
    }

    let granted = claims.scopes().ok_or(VerifyError::MissingScopes)?;
    let missing: Vec<String> = required_scopes
        .iter()
        .filter(|scope| !granted.contains(&scope.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(VerifyError::InsufficientScope(missing))
    }
}
