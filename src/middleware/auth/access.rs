//! Per-route permission layer: `Authorization: Bearer <jwt>` → verified `Claims` in extensions.
//!
//! 例：
//! ```ignore
//! let drinks = access::require(get(list_drinks), &state.auth, "get:drinks");
//! router.route("/drinks", drinks)
//! ```
//!
//! 検証の中身 (JWKS / iss / aud / exp / permissions) は `services::auth::Authorizer` 側。
//! ここは axum との接続だけを担う。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::services::auth::{AuthError, Authorizer};

#[derive(Clone)]
struct RequiredPermission {
    authorizer: Arc<Authorizer>,
    permission: &'static str,
}

/// Guard `route` so that only callers granted `permission` reach it.
pub fn require<S>(
    route: MethodRouter<S>,
    authorizer: &Arc<Authorizer>,
    permission: &'static str,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let required = RequiredPermission {
        authorizer: authorizer.clone(),
        permission,
    };

    // route_layer: 未マッチのメソッドは 405 のまま (認可より先に判定される)
    route.route_layer(middleware::from_fn_with_state(required, access_middleware))
}

async fn access_middleware(
    State(required): State<RequiredPermission>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| {
                    AuthError::MalformedHeader("Authorization header must be bearer token.")
                })?
                .to_owned(),
        ),
    };

    let result = required
        .authorizer
        .guard(header.as_deref(), required.permission, |claims| async move {
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(claims);
            next.run(req).await
        })
        .await;

    if let Err(err) = &result {
        tracing::warn!(
            code = err.code(),
            error = %err,
            permission = required.permission,
            "authorization rejected"
        );
    }

    result
}
