//! Commission handlers: the recipient's own view plus admin approval flow.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaginatedResponse;
use crate::domain::aggregates::CommissionStatus;
use crate::error::{Result, StoreError};
use crate::models::Commission;
use crate::state::{AppState, SessionUser};

#[derive(Debug, Deserialize)]
pub struct CommissionFilters {
    pub status: Option<CommissionStatus>,
    pub recipient_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_mine(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<Commission>>> {
    let user_id = user_id.ok_or(StoreError::Unauthenticated)?;
    let commissions = sqlx::query_as::<_, Commission>(
        "SELECT * FROM commissions WHERE recipient_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(commissions))
}

pub async fn list_all(
    State(state): State<AppState>,
    Query(filters): Query<CommissionFilters>,
) -> Result<Json<PaginatedResponse<Commission>>> {
    let page = filters.page.unwrap_or(1).max(1);
    let per_page = filters.per_page.unwrap_or(20).min(100);
    let commissions = sqlx::query_as::<_, Commission>(
        "SELECT * FROM commissions \
         WHERE ($1::commission_status IS NULL OR status = $1) \
         AND ($2::uuid IS NULL OR recipient_id = $2) \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(filters.status)
    .bind(filters.recipient_id)
    .bind(per_page as i64)
    .bind(super::page_offset(page, per_page))
    .fetch_all(&state.db)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM commissions \
         WHERE ($1::commission_status IS NULL OR status = $1) \
         AND ($2::uuid IS NULL OR recipient_id = $2)",
    )
    .bind(filters.status)
    .bind(filters.recipient_id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(PaginatedResponse { data: commissions, total, page }))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: CommissionStatus,
}

async fn transition(
    state: &AppState,
    id: Uuid,
    to: CommissionStatus,
) -> Result<Commission> {
    let commission = sqlx::query_as::<_, Commission>("SELECT * FROM commissions WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(StoreError::NotFound("commission"))?;
    let from = commission.status;
    if !from.allows(to) {
        return Err(StoreError::invalid_transition("commission", id, from, to));
    }

    sqlx::query_as::<_, Commission>(
        "UPDATE commissions SET status = $2, updated_at = NOW() \
         WHERE id = $1 AND status = $3 RETURNING *",
    )
    .bind(id)
    .bind(to)
    .bind(from)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| StoreError::invalid_transition("commission", id, from, to))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Commission>> {
    let commission = transition(&state, id, update.status).await?;
    Ok(Json(commission))
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusUpdate {
    pub commission_ids: Vec<Uuid>,
    pub status: CommissionStatus,
}

#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub commission_id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-row guarded updates; one failure never aborts the rest.
pub async fn bulk_status(
    State(state): State<AppState>,
    Json(update): Json<BulkStatusUpdate>,
) -> Result<Json<Vec<BulkOutcome>>> {
    let mut outcomes = Vec::with_capacity(update.commission_ids.len());
    for &id in &update.commission_ids {
        let outcome = match transition(&state, id, update.status).await {
            Ok(_) => BulkOutcome { commission_id: id, ok: true, error: None },
            Err(e) => BulkOutcome {
                commission_id: id,
                ok: false,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
    }
    Ok(Json(outcomes))
}
