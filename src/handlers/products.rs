//! Catalog handlers: storefront reads plus admin CRUD and stock adjustment.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::{ListParams, PaginatedResponse};
use crate::domain::value_objects::Sku;
use crate::error::{Result, StoreError};
use crate::models::Product;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>> {
    let search = params.search.clone().unwrap_or_default();
    let pattern = format!("%{search}%");
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE status = 'active' AND name ILIKE $1 \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&pattern)
    .bind(params.per_page() as i64)
    .bind(params.offset())
    .fetch_all(&state.db)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE status = 'active' AND name ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(PaginatedResponse { data: products, total, page: params.page() }))
}

pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE status <> 'deleted' ORDER BY created_at DESC \
         LIMIT $1 OFFSET $2",
    )
    .bind(params.per_page() as i64)
    .bind(params.offset())
    .fetch_all(&state.db)
    .await?;
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE status <> 'deleted'")
            .fetch_one(&state.db)
            .await?;
    Ok(Json(PaginatedResponse { data: products, total, page: params.page() }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND status = 'active'")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or(StoreError::NotFound("product"))
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    if payload.price < Decimal::ZERO {
        return Err(StoreError::BadRequest("price must not be negative".into()));
    }
    let sku = Sku::new(&payload.sku).map_err(|e| StoreError::BadRequest(e.to_string()))?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, sku, name, description, price, stock, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(sku.as_str())
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.stock.unwrap_or(0))
    .bind(&payload.image_url)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>> {
    if payload.price < Decimal::ZERO {
        return Err(StoreError::BadRequest("price must not be negative".into()));
    }
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, price = $4, image_url = $5, \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.image_url)
    .fetch_optional(&state.db)
    .await?
    .ok_or(StoreError::NotFound("product"))?;
    Ok(Json(product))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    sqlx::query("UPDATE products SET status = 'deleted', updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
}

/// Restock or correct inventory. The delta form keeps concurrent
/// adjustments from losing updates.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(adjustment): Json<StockAdjustment>,
) -> Result<Json<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET stock = stock + $2, backordered = stock + $2 < 0, \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(adjustment.delta)
    .fetch_optional(&state.db)
    .await?
    .ok_or(StoreError::NotFound("product"))?;
    Ok(Json(product))
}
