//! The authorization chain: header → token → verified claims → permission.

use std::future::Future;

use super::{AuthError, Claims, TokenVerifier, bearer::extract_bearer, check_permission};

/// Runs the full authorization chain for one request.
///
/// Framework-independent; the axum middleware is a thin adapter over
/// [`Authorizer::guard`].
#[derive(Debug)]
pub struct Authorizer {
    verifier: TokenVerifier,
}

impl Authorizer {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Authorize `header` for `permission`, returning the verified claims.
    pub async fn authorize(
        &self,
        header: Option<&str>,
        permission: &str,
    ) -> Result<Claims, AuthError> {
        let token = extract_bearer(header)?;
        let claims = self.verifier.verify(token).await?;
        check_permission(permission, &claims)?;

        Ok(claims)
    }

    /// Authorize, then run `operation` with the verified claims.
    ///
    /// `operation` is never invoked when authorization fails.
    pub async fn guard<F, Fut, T>(
        &self,
        header: Option<&str>,
        permission: &str,
        operation: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(header, permission).await?;
        Ok(operation(claims).await)
    }
}
