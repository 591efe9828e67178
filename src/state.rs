/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::authz::AuthorizationGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<AuthorizationGate>,
}

impl AppState {
    pub fn new(gate: Arc<AuthorizationGate>) -> Self {
        Self { gate }
    }
}
