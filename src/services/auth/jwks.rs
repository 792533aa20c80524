//! Issuer signing keys (JWKS): fetching, parsing and caching.
//!
//! ```text
//! resolve(kid)
//!   → cached key set for the JWKS url (fetch on miss, coalesced)
//!   → kid found?  return it
//!   → not found:  refetch if the set is older than `min_refresh`, look again
//! ```
//!
//! A zero TTL turns caching off and every resolution fetches the set again.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use moka::future::Cache;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::AuthError;

/// One public key from the issuer's key set, reduced to the fields needed to
/// verify a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub kty: String,
    pub kid: String,
    pub usage: Option<String>,
    pub n: String,
    pub e: String,
}

impl SigningKey {
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        // Encryption keys published alongside signing keys cannot verify.
        if self.kty != "RSA" || self.usage.as_deref().is_some_and(|u| u != "sig") {
            return Err(AuthError::UnparseableToken);
        }

        DecodingKey::from_rsa_components(&self.n, &self.e).map_err(|err| {
            tracing::warn!(kid = %self.kid, error = %err, "unusable rsa key in key set");
            AuthError::UnparseableToken
        })
    }
}

/// Keys published by the issuer, in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "JwksDocument")]
pub struct KeySet {
    keys: Vec<SigningKey>,
}

impl KeySet {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self { keys }
    }

    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// Wire shape of `/.well-known/jwks.json`. Entries without the fields we
// verify with are skipped rather than failing the whole document.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

#[derive(Debug, Deserialize)]
struct JwkEntry {
    kty: Option<String>,
    kid: Option<String>,
    #[serde(rename = "use")]
    usage: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

impl From<JwksDocument> for KeySet {
    fn from(doc: JwksDocument) -> Self {
        let keys = doc
            .keys
            .into_iter()
            .filter_map(|entry| {
                Some(SigningKey {
                    kty: entry.kty?,
                    kid: entry.kid?,
                    usage: entry.usage,
                    n: entry.n?,
                    e: entry.e?,
                })
            })
            .collect();

        Self::new(keys)
    }
}

/// Where key sets come from.
///
/// Implementations must be cheap to share (`Arc<dyn KeySource>`).
#[async_trait]
pub trait KeySource: Send + Sync {
    // Identifies the source in logs and as the cache key.
    fn location(&self) -> &str;

    async fn fetch(&self) -> Result<KeySet, AuthError>;
}

/// Fetches the key set over HTTP(S) with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    fn location(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch(&self) -> Result<KeySet, AuthError> {
        tracing::debug!(url = %self.url, "fetching key set");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| AuthError::KeyResolutionFailure(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeyResolutionFailure(format!(
                "key set endpoint responded with {status}"
            )));
        }

        response
            .json::<KeySet>()
            .await
            .map_err(|err| AuthError::KeyResolutionFailure(err.to_string()))
    }
}

// A key set together with the moment it was fetched.
#[derive(Debug)]
struct FetchedKeySet {
    keys: KeySet,
    fetched_at: Instant,
}

/// Resolves key ids to signing keys, caching the issuer's key set.
pub struct KeySetCache {
    source: Arc<dyn KeySource>,
    // None when caching is disabled (zero TTL).
    cache: Option<Cache<String, Arc<FetchedKeySet>>>,
    min_refresh: Duration,
    // Serializes forced refreshes so concurrent unknown kids fetch once.
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("source", &self.source.location())
            .field("cached", &self.cache.is_some())
            .field("min_refresh", &self.min_refresh)
            .finish()
    }
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration, min_refresh: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build()
        });

        Self {
            source,
            cache,
            min_refresh,
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn resolve(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let seen = self.key_set().await?;
        if let Some(key) = seen.keys.find(kid) {
            return Ok(key.clone());
        }

        // The issuer may have rotated keys since the set was cached.
        let Some(cache) = &self.cache else {
            return Err(AuthError::KeyNotFound);
        };
        let current = self.refresh_if_stale(cache, &seen, kid).await?;

        current.keys.find(kid).cloned().ok_or(AuthError::KeyNotFound)
    }

    async fn key_set(&self) -> Result<Arc<FetchedKeySet>, AuthError> {
        let Some(cache) = &self.cache else {
            return self.fetch().await;
        };

        cache
            .try_get_with(self.source.location().to_string(), self.fetch())
            .await
            .map_err(|err| (*err).clone())
    }

    // Refetch only when the set we looked in is older than `min_refresh`.
    // Unknown kids therefore delay a rotated key by at most that interval.
    async fn refresh_if_stale(
        &self,
        cache: &Cache<String, Arc<FetchedKeySet>>,
        seen: &Arc<FetchedKeySet>,
        kid: &str,
    ) -> Result<Arc<FetchedKeySet>, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.key_set().await?;
        if !Arc::ptr_eq(&current, seen) || current.fetched_at.elapsed() < self.min_refresh {
            return Ok(current);
        }

        tracing::info!(kid, source = self.source.location(), "unknown kid, refreshing key set");
        cache.invalidate(self.source.location()).await;
        self.key_set().await
    }

    async fn fetch(&self) -> Result<Arc<FetchedKeySet>, AuthError> {
        match self.source.fetch().await {
            Ok(keys) => {
                if keys.is_empty() {
                    tracing::warn!(source = self.source.location(), "key set has no usable keys");
                }
                tracing::debug!(source = self.source.location(), keys = keys.len(), "key set fetched");
                Ok(Arc::new(FetchedKeySet {
                    keys,
                    fetched_at: Instant::now(),
                }))
            }
            Err(err) => {
                tracing::warn!(source = self.source.location(), error = %err, "key set fetch failed");
                Err(err)
            }
        }
    }
}
