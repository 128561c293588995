//! Address book handlers, scoped to the session user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Result, StoreError};
use crate::models::{Address, AddressKind};
use crate::state::{AppState, SessionUser};

#[derive(Debug, Deserialize, Validate)]
pub struct AddressPayload {
    #[validate(length(min = 1, message = "recipient name is required"))]
    pub name: String,
    pub company: Option<String>,
    #[validate(length(min = 1, message = "street line is required"))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "zip is required"))]
    pub zip: String,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub kind: Option<AddressKind>,
    pub is_default: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<Address>>> {
    let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
    let addresses = sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(addresses))
}

pub async fn create(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(payload): Json<AddressPayload>,
) -> Result<(StatusCode, Json<Address>)> {
    let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
    payload.validate()?;

    let mut tx = state.db.begin().await?;
    let make_default = payload.is_default.unwrap_or(false);
    if make_default {
        sqlx::query("UPDATE addresses SET is_default = FALSE, updated_at = NOW() \
                     WHERE user_id = $1 AND is_default")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }
    let address = sqlx::query_as::<_, Address>(
        "INSERT INTO addresses (id, user_id, name, company, line1, line2, city, state, zip, \
         country, phone, kind, is_default) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.company)
    .bind(&payload.line1)
    .bind(&payload.line2)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.zip)
    .bind(payload.country.as_deref().unwrap_or("IN"))
    .bind(&payload.phone)
    .bind(payload.kind.unwrap_or(AddressKind::Home))
    .bind(make_default)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressPayload>,
) -> Result<Json<Address>> {
    let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
    payload.validate()?;
    let address = sqlx::query_as::<_, Address>(
        "UPDATE addresses SET name = $3, company = $4, line1 = $5, line2 = $6, city = $7, \
         state = $8, zip = $9, country = $10, phone = $11, kind = $12, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.company)
    .bind(&payload.line1)
    .bind(&payload.line2)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.zip)
    .bind(payload.country.as_deref().unwrap_or("IN"))
    .bind(&payload.phone)
    .bind(payload.kind.unwrap_or(AddressKind::Home))
    .fetch_optional(&state.db)
    .await?
    .ok_or(StoreError::NotFound("address"))?;
    Ok(Json(address))
}

/// Swaps the default flag to this address. Clearing the previous default
/// and setting the new one happen in one transaction so there is never a
/// window with two defaults.
pub async fn set_default(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Address>> {
    let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
    let mut tx = state.db.begin().await?;
    sqlx::query(
        "UPDATE addresses SET is_default = FALSE, updated_at = NOW() \
         WHERE user_id = $1 AND is_default",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    let address = sqlx::query_as::<_, Address>(
        "UPDATE addresses SET is_default = TRUE, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(StoreError::NotFound("address"))?;
    tx.commit().await?;
    Ok(Json(address))
}

pub async fn delete(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("address"));
    }
    Ok(StatusCode::NO_CONTENT)
}
