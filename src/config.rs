/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::auth::AuthSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
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
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
// Drink payloads are a title plus a short recipe.
const DEFAULT_HTTP_BODY_LIMIT_BYTES: usize = 64 * 1024;

pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Issuer domain, e.g. `dev-xyz.us.auth0.com`. The issuer is `https://{domain}/`.
    pub auth_domain: String,
    pub auth_audience: String,
    pub auth_algorithms: Vec<Algorithm>,
    pub auth_jwks_url: Url,
    pub access_token_leeway_seconds: u64,

    pub jwks_timeout_seconds: u64,
    pub jwks_cache_ttl_seconds: u64,
    pub jwks_min_refresh_seconds: u64,

    // Whole-request timeout; also bounds a slow key set fetch.
    pub http_timeout_seconds: u64,
    pub http_body_limit_bytes: usize,
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

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_domain = std::env::var("AUTH_DOMAIN")
            .map_err(|_| ConfigError::Missing("AUTH_DOMAIN"))?
            .trim()
            .trim_end_matches('/')
            .to_string();
        if auth_domain.is_empty() {
            return Err(ConfigError::Invalid("AUTH_DOMAIN"));
        }

        let auth_audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let auth_algorithms = parse_algorithms(
            &std::env::var("AUTH_ALGORITHMS").unwrap_or_else(|_| "RS256".to_string()),
        )?;

        let auth_jwks_url = match std::env::var("AUTH_JWKS_URL") {
            Ok(url) => Url::parse(&url).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?,
            Err(_) => default_jwks_url(&auth_domain)?,
        };

        let access_token_leeway_seconds = env_u64(
            "ACCESS_TOKEN_LEEWAY_SECONDS",
            AuthSettings::DEFAULT_LEEWAY_SECONDS,
        );
        let jwks_timeout_seconds = env_u64(
            "JWKS_TIMEOUT_SECONDS",
            AuthSettings::DEFAULT_JWKS_TIMEOUT_SECONDS,
        );
        let jwks_cache_ttl_seconds = env_u64(
            "JWKS_CACHE_TTL_SECONDS",
            AuthSettings::DEFAULT_JWKS_CACHE_TTL_SECONDS,
        );
        let jwks_min_refresh_seconds = env_u64(
            "JWKS_MIN_REFRESH_SECONDS",
            AuthSettings::DEFAULT_JWKS_MIN_REFRESH_SECONDS,
        );

        let http_timeout_seconds = env_u64("HTTP_TIMEOUT_SECONDS", DEFAULT_HTTP_TIMEOUT_SECONDS);
        if http_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"));
        }
        let http_body_limit_bytes = std::env::var("HTTP_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_HTTP_BODY_LIMIT_BYTES);

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            auth_domain,
            auth_audience,
            auth_algorithms,
            auth_jwks_url,
            access_token_leeway_seconds,
            jwks_timeout_seconds,
            jwks_cache_ttl_seconds,
            jwks_min_refresh_seconds,
            http_timeout_seconds,
            http_body_limit_bytes,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn auth_issuer(&self) -> Result<Url, ConfigError> {
        Url::parse(&format!("https://{}/", self.auth_domain))
            .map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))
    }

    pub fn auth_settings(&self) -> Result<AuthSettings, ConfigError> {
        Ok(AuthSettings {
            issuer: self.auth_issuer()?,
            audience: self.auth_audience.clone(),
            algorithms: self.auth_algorithms.clone(),
            jwks_url: self.auth_jwks_url.clone(),
            leeway_seconds: self.access_token_leeway_seconds,
            jwks_timeout: Duration::from_secs(self.jwks_timeout_seconds),
            jwks_cache_ttl: Duration::from_secs(self.jwks_cache_ttl_seconds),
            jwks_min_refresh: Duration::from_secs(self.jwks_min_refresh_seconds),
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn default_jwks_url(domain: &str) -> Result<Url, ConfigError> {
    Url::parse(&format!("https://{}/.well-known/jwks.json", domain))
        .map_err(|_| ConfigError::Invalid("AUTH_DOMAIN"))
}

// Signing keys are RSA, so only the RSA families can ever verify.
// Mixing families would also make jsonwebtoken reject every token.
fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Algorithm::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS"))?;

    let all_rsa = algorithms.iter().all(|alg| {
        matches!(
            alg,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        )
    });
    if algorithms.is_empty() || !all_rsa {
        return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
    }

    Ok(algorithms)
}

#[cfg(test)]
impl Config {
    pub fn for_tests(app_env: AppEnv) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "postgres://localhost/coffee_shop_test".into(),
            app_env,
            cors_allowed_origins: Vec::new(),
            auth_domain: "dev-test.example.com".into(),
            auth_audience: "coffee_shop".into(),
            auth_algorithms: vec![Algorithm::RS256],
            auth_jwks_url: Url::parse("https://dev-test.example.com/.well-known/jwks.json")
                .expect("static url"),
            access_token_leeway_seconds: AuthSettings::DEFAULT_LEEWAY_SECONDS,
            jwks_timeout_seconds: AuthSettings::DEFAULT_JWKS_TIMEOUT_SECONDS,
            jwks_cache_ttl_seconds: AuthSettings::DEFAULT_JWKS_CACHE_TTL_SECONDS,
            jwks_min_refresh_seconds: AuthSettings::DEFAULT_JWKS_MIN_REFRESH_SECONDS,
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            http_body_limit_bytes: DEFAULT_HTTP_BODY_LIMIT_BYTES,
        }
    }
}
