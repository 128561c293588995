//! Payment verification endpoint. The hosted checkout widget posts its
//! success callback here.

use axum::extract::State;
use axum::Json;

use crate::error::Result;
use crate::models;
use crate::services::payment::{self, VerifyPaymentRequest};
use crate::state::AppState;

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<models::Order>> {
    let order = payment::verify_payment(&state, req).await?;
    Ok(Json(order))
}
