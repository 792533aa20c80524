/*
 * Responsibility
 * - drinks テーブル向け SQLx 操作
 * - recipe は JSON テキストとして保存し、読み出し時に Ingredient に戻す
 * - title の一意制約違反は RepoError::Conflict
 */
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[derive(Debug, FromRow)]
struct DrinkRow {
    id: i32,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = RepoError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            recipe: serde_json::from_str(&row.recipe)?,
        })
    }
}

pub async fn ensure_schema(db: &PgPool) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drinks (
            id SERIAL PRIMARY KEY,
            title VARCHAR(80) NOT NULL UNIQUE,
            recipe TEXT NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    Ok(())
}

pub async fn list(db: &PgPool) -> Result<Vec<Drink>, RepoError> {
    let rows = sqlx::query_as::<_, DrinkRow>(
        r#"
        SELECT id, title, recipe
        FROM drinks
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await?;

    rows.into_iter().map(Drink::try_from).collect()
}

pub async fn get(db: &PgPool, id: i32) -> Result<Option<Drink>, RepoError> {
    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        SELECT id, title, recipe
        FROM drinks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(Drink::try_from).transpose()
}

pub async fn create(db: &PgPool, title: &str, recipe: &[Ingredient]) -> Result<Drink, RepoError> {
    let recipe = serde_json::to_string(recipe)?;

    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        INSERT INTO drinks (title, recipe)
        VALUES ($1, $2)
        RETURNING id, title, recipe
        "#,
    )
    .bind(title)
    .bind(recipe)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Drink::try_from(row)
}

pub async fn update(
    db: &PgPool,
    id: i32,
    title: Option<&str>,
    recipe: Option<&[Ingredient]>,
) -> Result<Option<Drink>, RepoError> {
    let recipe = recipe.map(serde_json::to_string).transpose()?;

    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        UPDATE drinks
        SET
            title = COALESCE($2, title),
            recipe = COALESCE($3, recipe)
        WHERE id = $1
        RETURNING id, title, recipe
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(recipe)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    row.map(Drink::try_from).transpose()
}

pub async fn delete(db: &PgPool, id: i32) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM drinks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
