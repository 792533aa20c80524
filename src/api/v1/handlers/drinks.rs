/*
 * Responsibility
 * - /drinks 系 CRUD handler
 * - 認可は route 側の permission layer で完了済み。handler は検証済み Claims を第一引数で受け取る
 * - body の形式エラーは 422 (unprocessable)
 * - PATCH は id の存在確認 (404) を body の検証より先に行う
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    api::v1::dto::drinks::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinksResponse, LongDrink, ShortDrink,
        UpdateDrinkRequest,
    },
    error::AppError,
    repos::drink_repo,
    services::auth::Claims,
    state::AppState,
};

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(req)| req)
        .map_err(|rejection| AppError::unprocessable(rejection.body_text()))
}

pub async fn list_drinks(
    _claims: Claims,
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<ShortDrink>>, AppError> {
    let drinks = drink_repo::list(&state.db).await?;

    Ok(Json(DrinksResponse::counted(
        drinks.into_iter().map(ShortDrink::from).collect(),
    )))
}

pub async fn list_drinks_detail(
    _claims: Claims,
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<LongDrink>>, AppError> {
    let drinks = drink_repo::list(&state.db).await?;

    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(LongDrink::from).collect(),
    )))
}

pub async fn create_drink(
    claims: Claims,
    State(state): State<AppState>,
    body: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<LongDrink>>, AppError> {
    let req = json_body(body)?;
    req.validate().map_err(AppError::unprocessable)?;

    let drink = drink_repo::create(&state.db, req.title.trim(), &req.recipe).await?;
    tracing::info!(drink_id = drink.id, sub = ?claims.sub, "drink created");

    Ok(Json(DrinksResponse::new(vec![LongDrink::from(drink)])))
}

pub async fn update_drink(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<LongDrink>>, AppError> {
    // An unknown id is reported before anything about the body.
    if drink_repo::get(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("drink"));
    }

    let req = json_body(body)?;
    req.validate().map_err(AppError::unprocessable)?;

    let drink = drink_repo::update(
        &state.db,
        id,
        req.title.as_deref().map(str::trim),
        req.recipe.as_deref(),
    )
    .await?
    .ok_or(AppError::not_found("drink"))?;
    tracing::info!(drink_id = drink.id, sub = ?claims.sub, "drink updated");

    Ok(Json(DrinksResponse::new(vec![LongDrink::from(drink)])))
}

pub async fn delete_drink(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    if !drink_repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("drink"));
    }
    tracing::info!(drink_id = id, sub = ?claims.sub, "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
