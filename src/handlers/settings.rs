//! Commission-level settings (admin).

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::CommissionSetting;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CommissionSetting>>> {
    let settings = sqlx::query_as::<_, CommissionSetting>(
        "SELECT * FROM commission_settings ORDER BY level",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
pub struct SettingPayload {
    pub level: i32,
    pub percentage: Decimal,
    pub is_active: bool,
}

/// Upserts one level. Deactivating a level stops future crediting only;
/// commissions already created keep their amounts and statuses.
pub async fn upsert(
    State(state): State<AppState>,
    Json(payload): Json<SettingPayload>,
) -> Result<Json<CommissionSetting>> {
    if payload.level < 1 {
        return Err(StoreError::BadRequest("level must be at least 1".into()));
    }
    if payload.percentage < Decimal::ZERO || payload.percentage > Decimal::from(100) {
        return Err(StoreError::BadRequest(
            "percentage must be between 0 and 100".into(),
        ));
    }
    let setting = sqlx::query_as::<_, CommissionSetting>(
        "INSERT INTO commission_settings (id, level, percentage, is_active) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (level) DO UPDATE \
         SET percentage = EXCLUDED.percentage, is_active = EXCLUDED.is_active, \
         updated_at = NOW() RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.level)
    .bind(payload.percentage)
    .bind(payload.is_active)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(setting))
}
