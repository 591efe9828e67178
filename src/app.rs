/*
 * Responsibility
 * - Config読み込み → tracing 初期化 → 依存生成 → Router 組み立て
 * - Middleware の適用 (authz / HTTP レイヤ)
 * - axum::serve() で起動
 */
use std::{panic, process};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{AuthzConfig, Config};
use crate::middleware;
use crate::services::authz::{KeyError, build_gate};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins; LOG_LEVEL (e.g. "debug") is the short form; otherwise a sensible default.
    // Ex:
    // RUST_LOG=info,token_gate=debug,tower_http=debug cargo run
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Fallback hook: prints location and payload to stderr.
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development aborts so a broken gate is noticed at once; production keeps serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting token-gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    let state = build_state(&config)?;
    log_authz_config(state.gate.config());

    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// Misconfiguration is not fatal: every guarded request answers 400 until it is fixed.
fn log_authz_config(authz: &AuthzConfig) {
    match authz {
        AuthzConfig::Disabled => tracing::info!("REQUIRE not set, authorization disabled"),
        AuthzConfig::Enabled(policy) => tracing::info!(
            scopes = ?policy.required_scopes,
            key_source = ?policy.key_source,
            "authorization enabled"
        ),
        AuthzConfig::Invalid(err) => {
            tracing::error!(error = %err, "bad authorization configuration")
        }
    }
}

pub fn build_state(config: &Config) -> Result<AppState, KeyError> {
    let gate = build_gate(config)?;
    Ok(AppState::new(gate))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let v1 = api::v1::routes();
    let v1 = middleware::authz::apply(v1, state.clone());

    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", v1)
        .with_state(state);

    middleware::http::apply(router, config.request_timeout)
}
