//! Bearer token authorization for guarded routes.
//!
//! Runs the `AuthorizationGate` and maps its decision onto the request:
//! - `NotRequired`: pass through untouched
//! - `Allowed`: verified `Claims` go into request extensions for the handler
//! - `Denied`: respond with the 400/403 error, the handler never runs

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::authz::Decision;
use crate::state::AppState;

/// Guard every route of `router` with the authorization gate.
///
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::authz::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, authz_middleware))
}

async fn authz_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match state.gate.authorize(req.headers()).await {
        Decision::NotRequired => {}
        Decision::Allowed(claims) => {
            req.extensions_mut().insert(claims);
        }
        Decision::Denied(err) => {
            tracing::warn!(status = %err.status(), reason = %err, "request denied");
            return Err(err);
        }
    }

    Ok(next.run(req).await)
}
