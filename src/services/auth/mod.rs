/*
 * Responsibility
 * - Bearer token extraction, JWKS-backed token verification, permission checks
 * - Authorizer: composes the above for the HTTP layer
 * - No axum routing here (middleware::auth wires it into routes)
 */
pub mod authorizer;
pub mod bearer;
pub mod error;
pub mod factory;
pub mod jwks;
pub mod permission;
pub mod settings;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use authorizer::Authorizer;
pub use error::AuthError;
pub use factory::build_authorizer;
pub use jwks::{HttpKeySource, KeySetCache};
pub use permission::check_permission;
pub use settings::AuthSettings;
pub use verifier::{Claims, TokenVerifier};
