/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - ここに並ぶ route は全て認可 middleware の内側に置かれる (app::build_router)
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::hello::hello;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/hello", get(hello))
}
