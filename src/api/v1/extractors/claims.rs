use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::authz::Claims;

/// Verified claims placed in request extensions by the authz middleware.
///
/// `None` when authorization is not configured (the gate let the request through without a token).
/// Routes outside the middleware always see `None`.
pub struct MaybeClaims(pub Option<Claims>);

impl<S> FromRequestParts<S> for MaybeClaims
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeClaims(parts.extensions.get::<Claims>().cloned()))
    }
}
