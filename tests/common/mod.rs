//! Shared helpers for the router-level tests.
#![allow(dead_code)]

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use token_gate::{
    app,
    config::{AppEnv, AuthzConfig, Config},
};
use tower::ServiceExt;
use url::Url;

pub const AUDIENCE: &str = "https://treasure";
pub const ISSUER: &str = "https://pyrates";
pub const RSA_KID: &str = "5b889a22-6e44-45f7-8f5e-537db1d9b16e";

const RSA_PRIVATE_PEM: &[u8] = include_bytes!("../resources/private.pem");
const RSA_PRIVATE_B_PEM: &[u8] = include_bytes!("../resources/private_b.pem");
const JWKS_JSON: &str = include_str!("../resources/jwks.json");

pub fn resource_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join(name)
}

pub fn config(authz: AuthzConfig) -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        app_env: AppEnv::Development,
        request_timeout: Duration::from_secs(30),
        authz,
        token_leeway_seconds: 0,
        jwks_timeout: Duration::from_secs(5),
        jwks_cache_ttl: None,
        jwks_refresh_cooldown: Duration::from_secs(10),
    }
}

/// Authz settings as they would come from the environment.
pub fn authz(pairs: &[(&str, &str)]) -> AuthzConfig {
    AuthzConfig::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
}

pub fn router(config: &Config) -> Router {
    let state = app::build_state(config).unwrap();
    app::build_router(state, config)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

pub async fn get_with(router: Router, path: &str, authorization: Option<&str>) -> Reply {
    let mut request = Request::builder().uri(path);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }

    let response = router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    Reply {
        status,
        headers,
        body,
    }
}

pub async fn hello(router: Router, token: Option<&str>) -> Reply {
    let authorization = token.map(|t| format!("bearer {t}"));
    get_with(router, "/api/v1/hello", authorization.as_deref()).await
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims_with_scopes(scopes: &[&str]) -> Value {
    let now = now();
    json!({
        "aud": AUDIENCE,
        "iss": ISSUER,
        "sub": "1234567890",
        "iat": now,
        "exp": now + 20 * 60,
        "scopes": scopes,
    })
}

pub fn claims() -> Value {
    claims_with_scopes(&["treasure:read"])
}

pub fn expired_claims() -> Value {
    let mut claims = claims();
    claims["exp"] = json!(now() - 20 * 60);
    claims
}

fn sign(pem: &[u8], claims: &Value, kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}

pub fn token(claims: &Value, kid: Option<&str>) -> String {
    sign(RSA_PRIVATE_PEM, claims, kid)
}

pub fn token_from_other_key(claims: &Value, kid: Option<&str>) -> String {
    sign(RSA_PRIVATE_B_PEM, claims, kid)
}

/// Serve `tests/resources/jwks.json` at `/jwks.json` on an ephemeral port.
pub async fn serve_jwks() -> Url {
    let app = Router::new().route(
        "/jwks.json",
        get(|| async { ([(header::CONTENT_TYPE, "application/json")], JWKS_JSON) }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Url::parse(&format!("http://{addr}/jwks.json")).unwrap()
}
