use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

/// Knobs the authorization core is built from.
///
/// Kept separate from `Config` so the core can be constructed in tests
/// without touching the environment.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    // Expected `iss`, e.g. `https://dev-xyz.us.auth0.com/`.
    pub issuer: Url,
    // Expected `aud`.
    pub audience: String,
    // Algorithms a token may be signed with; anything else is rejected.
    pub algorithms: Vec<Algorithm>,
    pub jwks_url: Url,
    // Allowed clock skew when checking `exp`, seconds.
    pub leeway_seconds: u64,
    pub jwks_timeout: Duration,
    // Zero disables key set caching.
    pub jwks_cache_ttl: Duration,
    // Minimum gap between refreshes forced by an unknown `kid`.
    pub jwks_min_refresh: Duration,
}

impl AuthSettings {
    // A token must still be valid at verification time unless skew is configured.
    pub const DEFAULT_LEEWAY_SECONDS: u64 = 0;
    pub const DEFAULT_JWKS_TIMEOUT_SECONDS: u64 = 5;
    pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 600;
    pub const DEFAULT_JWKS_MIN_REFRESH_SECONDS: u64 = 30;
}
