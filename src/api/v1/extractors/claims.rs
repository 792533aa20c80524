use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::auth::Claims;

/// Handler で、検証済み Claims を受け取るための extractor
/// permission layer が Claims を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（route に permission layer が付いていない）
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Claims>().cloned().ok_or_else(|| {
            tracing::error!("claims requested on a route without a permission layer");
            StatusCode::UNAUTHORIZED
        })
    }
}
