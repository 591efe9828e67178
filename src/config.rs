/*
 * Responsibility
 * - 環境変数 (.env) から設定を読み込む
 * - サーバ設定の不備は起動失敗、認可設定の不備はリクエスト毎の 400 として扱う
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::authz::KeySource;

pub const REQUIRE: &str = "REQUIRE";
pub const AUDIENCE: &str = "AUDIENCE";
pub const ISSUER: &str = "ISSUER";
pub const JWKS_PATH: &str = "JWKSPATH";
pub const SIGNATURE_KEY_PATH: &str = "SIGNATUREKEYPATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Authorization settings that cannot be acted on. Reported per request as 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzConfigError {
    #[error("audience or issuer is not set")]
    MissingAudienceOrIssuer,
    #[error("neither JWKSPATH nor SIGNATUREKEYPATH is set")]
    NoKeySource,
    #[error("both JWKSPATH and SIGNATUREKEYPATH are set")]
    BothKeySources,
    #[error("JWKSPATH is not a valid URL: {0}")]
    InvalidJwksUrl(String),
}

/// Validated authorization settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzPolicy {
    pub required_scopes: Vec<String>,
    pub audience: String,
    pub issuer: String,
    pub key_source: KeySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzConfig {
    // REQUIRE is unset or empty: requests pass without a token.
    Disabled,
    Enabled(AuthzPolicy),
    Invalid(AuthzConfigError),
}

impl AuthzConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let required_scopes = parse_scopes(lookup(REQUIRE).as_deref().unwrap_or_default());
        if required_scopes.is_empty() {
            return Self::Disabled;
        }

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (Some(audience), Some(issuer)) = (non_empty(AUDIENCE), non_empty(ISSUER)) else {
            return Self::Invalid(AuthzConfigError::MissingAudienceOrIssuer);
        };

        let key_source = match (non_empty(JWKS_PATH), non_empty(SIGNATURE_KEY_PATH)) {
            (Some(_), Some(_)) => return Self::Invalid(AuthzConfigError::BothKeySources),
            (None, None) => return Self::Invalid(AuthzConfigError::NoKeySource),
            (Some(uri), None) => match Url::parse(uri.trim()) {
                Ok(url) => KeySource::Remote(url),
                Err(_) => return Self::Invalid(AuthzConfigError::InvalidJwksUrl(uri)),
            },
            (None, Some(path)) => KeySource::Fixed(PathBuf::from(path.trim())),
        };

        Self::Enabled(AuthzPolicy {
            required_scopes,
            audience,
            issuer,
            key_source,
        })
    }
}

/// `REQUIRE` is a comma-separated list; whitespace around entries is ignored.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,

    pub authz: AuthzConfig,
    // Clock skew tolerated on exp/nbf.
    pub token_leeway_seconds: u64,

    pub jwks_timeout: Duration,
    // None disables the JWK set cache.
    pub jwks_cache_ttl: Option<Duration>,
    // Minimum gap between forced JWK set refreshes on a kid miss.
    pub jwks_refresh_cooldown: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();
        let request_timeout =
            Duration::from_secs(env_u64("REQUEST_TIMEOUT_SECONDS").unwrap_or(30));

        let authz = AuthzConfig::from_env();

        let token_leeway_seconds = env_u64("TOKEN_LEEWAY_SECONDS").unwrap_or(0);

        let jwks_timeout = Duration::from_secs(env_u64("JWKS_TIMEOUT_SECONDS").unwrap_or(5));

        let jwks_cache_ttl = match env_u64("JWKS_CACHE_TTL_SECONDS").unwrap_or(300) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let jwks_refresh_cooldown =
            Duration::from_secs(env_u64("JWKS_REFRESH_COOLDOWN_SECONDS").unwrap_or(10));

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            authz,
            token_leeway_seconds,
            jwks_timeout,
            jwks_cache_ttl,
            jwks_refresh_cooldown,
        })
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
