use super::{AuthError, Claims};

/// Require `permission` to be granted by `claims`.
///
/// Permission strings are opaque and compared exactly.
pub fn check_permission(permission: &str, claims: &Claims) -> Result<(), AuthError> {
    if claims.permissions.is_none() {
        return Err(AuthError::InvalidToken("Permissions not included in token."));
    }

    if !claims.has_permission(permission) {
        return Err(AuthError::InvalidToken("Permission not found."));
    }

    Ok(())
}
