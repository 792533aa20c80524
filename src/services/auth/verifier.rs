//! Access token verification against the issuer's published keys.

use std::collections::BTreeSet;

use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AuthError, AuthSettings, KeySetCache};

/// Decoded access token payload.
///
/// `iss`, `aud` and `exp` are validated by the verifier before this value is
/// handed out. Claims the service does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    // Either a string or an array of strings.
    pub aud: Value,
    pub exp: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    // Absent and empty are different failures for the permission check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|granted| granted.contains(permission))
    }
}

/// Verifies RS256 (or otherwise configured) access tokens.
///
/// jsonwebtoken only checks the signature and algorithm here. Claim checks run
/// on the raw payload so that expiry wins over every other claim failure.
#[derive(Debug)]
pub struct TokenVerifier {
    keys: KeySetCache,
    validation: Validation,
    issuer: String,
    audience: String,
    leeway_seconds: u64,
}

impl TokenVerifier {
    pub fn new(keys: KeySetCache, settings: &AuthSettings) -> Self {
        let first = settings.algorithms.first().copied().unwrap_or(Algorithm::RS256);

        let mut validation = Validation::new(first);
        if !settings.algorithms.is_empty() {
            validation.algorithms = settings.algorithms.clone();
        }
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            keys,
            validation,
            issuer: settings.issuer.to_string(),
            audience: settings.audience.clone(),
            leeway_seconds: settings.leeway_seconds,
        }
    }

    /// Verify the signature and standard claims of `token`.
    ///
    /// The header is read unverified only to find the key id; everything else
    /// is trusted after the signature checks out.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let key = self.keys.resolve(&kid).await?;
        let decoding_key = key.decoding_key()?;

        let payload = jsonwebtoken::decode::<Value>(token, &decoding_key, &self.validation)
            .map_err(|err| classify(&err))?
            .claims;

        self.check_expiry(&payload, jsonwebtoken::get_current_timestamp())?;
        self.check_issuer_and_audience(&payload)?;

        serde_json::from_value(payload).map_err(|err| {
            tracing::debug!(error = %err, "claims do not match the expected shape");
            AuthError::InvalidClaims
        })
    }

    fn check_expiry(&self, payload: &Value, now: u64) -> Result<(), AuthError> {
        let exp = payload
            .get("exp")
            .and_then(Value::as_u64)
            .ok_or(AuthError::InvalidClaims)?;

        if exp.saturating_add(self.leeway_seconds) <= now {
            return Err(AuthError::TokenExpired);
        }

        Ok(())
    }

    fn check_issuer_and_audience(&self, payload: &Value) -> Result<(), AuthError> {
        let issuer_ok = payload.get("iss").and_then(Value::as_str) == Some(self.issuer.as_str());

        // `aud` may be a single string or a list of strings.
        let audience_ok = match payload.get("aud") {
            Some(Value::String(aud)) => *aud == self.audience,
            Some(Value::Array(auds)) => auds
                .iter()
                .any(|aud| aud.as_str() == Some(self.audience.as_str())),
            _ => false,
        };

        if !issuer_ok || !audience_ok {
            return Err(AuthError::InvalidClaims);
        }

        Ok(())
    }
}

// Only signature, algorithm and payload decoding errors reach this point.
fn classify(err: &jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::Json(_) => AuthError::InvalidClaims,
        _ => {
            tracing::debug!(error = %err, "token rejected");
            AuthError::UnparseableToken
        }
    }
}
