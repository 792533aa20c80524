//! `Authorization: Bearer <token>` parsing.

use super::AuthError;

/// Pull the bearer token out of an `Authorization` header value.
///
/// The scheme is matched case-insensitively and the header must consist of
/// exactly two whitespace-separated segments. The token itself is returned
/// verbatim; its shape is the verifier's problem.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header
        .filter(|h| !h.trim().is_empty())
        .ok_or(AuthError::MissingHeader)?;

    let mut parts = header.split_whitespace();

    let scheme = parts.next().ok_or(AuthError::MissingHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader(
            "Authorization header must start with \"Bearer\".",
        ));
    }

    let token = parts
        .next()
        .ok_or(AuthError::MalformedHeader("Token not found."))?;

    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader(
            "Authorization header must be bearer token.",
        ));
    }

    Ok(token)
}
