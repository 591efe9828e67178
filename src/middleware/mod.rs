/*
 * Responsibility
 * - middleware の公開インターフェース
 * - authz: bearer token による認可, http: 横断的な HTTP レイヤ
 */
pub mod authz;
pub mod http;
