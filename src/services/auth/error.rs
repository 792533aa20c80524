//! Authorization failures and their wire representation.
//!
//! Every stage of the authorization chain fails with [`AuthError`]. The
//! variant decides the HTTP status and the `code` field; the response body is
//! always `{"code": ..., "description": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,

    #[error("{0}")]
    MalformedHeader(&'static str),

    // Token header could not be decoded, or carries no `kid`.
    #[error("Authorization malformed.")]
    MalformedToken,

    #[error("Unable to find the appropriate key.")]
    KeyNotFound,

    #[error("unable to fetch signing keys: {0}")]
    KeyResolutionFailure(String),

    // Bad signature, disallowed algorithm or unusable key material.
    #[error("Unable to parse authentication token.")]
    UnparseableToken,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("{0}")]
    InvalidToken(&'static str),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::MalformedHeader(_) | Self::MalformedToken | Self::UnparseableToken => {
                "invalid_header"
            }
            Self::KeyNotFound => "key_not_found",
            Self::KeyResolutionFailure(_) => "jwks_unavailable",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims => "invalid_claims",
            Self::InvalidToken(_) => "invalid_token",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::KeyNotFound | Self::UnparseableToken => StatusCode::BAD_REQUEST,
            Self::KeyResolutionFailure(_) => StatusCode::BAD_GATEWAY,
            // Permission failures stay 401 to match existing clients.
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Upstream failure details are kept out of it.
    pub fn description(&self) -> String {
        match self {
            Self::KeyResolutionFailure(_) => "Unable to fetch signing keys.".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AuthErrorBody {
    code: &'static str,
    description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = AuthErrorBody {
            code: self.code(),
            description: self.description(),
        };

        (self.status(), Json(body)).into_response()
    }
}
