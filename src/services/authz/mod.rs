/*
 * Responsibility
 * - Bearer token authorization: header extraction → key resolution → verification → decision
 * - Every failure ends as a Decision; nothing here returns early with a panic or `?` to the caller
 */
pub mod bearer;
pub mod factory;
pub mod gate;
pub mod keys;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::build_gate;
pub use gate::{AuthorizationGate, Decision};
pub use keys::{KeyError, KeyResolver, KeySource, ResolvedKey};
pub use verifier::{Claims, TokenVerifier, VerifyError};
