/// Factory: build the `Authorizer` from `AuthSettings`.
use std::sync::Arc;

use crate::error::AppError;
use crate::services::auth::{AuthSettings, Authorizer, HttpKeySource, KeySetCache, TokenVerifier};

pub fn build_authorizer(settings: &AuthSettings) -> Result<Arc<Authorizer>, AppError> {
    let source = HttpKeySource::new(settings.jwks_url.clone(), settings.jwks_timeout).map_err(|e| {
        tracing::error!(error = %e, "failed to build key set http client");
        AppError::Internal
    })?;

    let keys = KeySetCache::new(
        Arc::new(source),
        settings.jwks_cache_ttl,
        settings.jwks_min_refresh,
    );
    let verifier = TokenVerifier::new(keys, settings);

    tracing::info!(
        issuer = %settings.issuer,
        audience = %settings.audience,
        jwks_url = %settings.jwks_url,
        "authorizer ready"
    );

    Ok(Arc::new(Authorizer::new(verifier)))
}
