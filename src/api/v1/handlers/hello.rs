/*
 * Responsibility
 * - GET /api/v1/hello
 * - 認可済みなら検証済み claims をそのまま返す, 認可未設定なら既定の挨拶を返す
 */
use axum::{
    Json,
    response::{IntoResponse, Response},
};

use crate::api::v1::extractors::MaybeClaims;

pub fn greeting() -> String {
    format!(
        "Hello, World! ({} {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

pub async fn hello(MaybeClaims(claims): MaybeClaims) -> Response {
    match claims {
        Some(claims) => Json(claims).into_response(),
        None => greeting().into_response(),
    }
}
