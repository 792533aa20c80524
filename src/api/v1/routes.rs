/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /drinks, /drinks-detail, /drinks/{id}
 * - 各 route に必要な permission をここで宣言する (access::require)
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::auth::access::require;
use crate::state::AppState;

use crate::api::v1::handlers::{
    drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
    health::health,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let auth = &state.auth;

    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            require(get(list_drinks), auth, "get:drinks")
                .merge(require(post(create_drink), auth, "post:drinks")),
        )
        .route(
            "/drinks-detail",
            require(get(list_drinks_detail), auth, "get:drinks-detail"),
        )
        .route(
            "/drinks/{id}",
            require(patch(update_drink), auth, "patch:drinks")
                .merge(require(delete(delete_drink), auth, "delete:drinks")),
        )
}
