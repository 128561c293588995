//! Admin-driven order status transitions, single and bulk.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::error::{Result, StoreError};
use crate::models;
use crate::state::AppState;

/// Applies one admin transition. PENDING -> PAID is reserved for payment
/// verification (it carries the stock decrement and commission crediting),
/// so PAID is not a manual target.
pub async fn transition_order(
    state: &AppState,
    order_id: Uuid,
    to: OrderStatus,
) -> Result<models::Order> {
    if to == OrderStatus::Paid || to == OrderStatus::Pending {
        return Err(StoreError::BadRequest(format!(
            "{to} is not a manual transition target"
        )));
    }

    let order = sqlx::query_as::<_, models::Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(StoreError::OrderNotFound)?;
    let from = order.status;
    if !from.allows(to) {
        return Err(StoreError::invalid_transition("order", order_id, from, to));
    }

    let mut tx = state.db.begin().await?;
    let updated = sqlx::query_as::<_, models::Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() \
         WHERE id = $1 AND status = $3 RETURNING *",
    )
    .bind(order_id)
    .bind(to)
    .bind(from)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(updated) = updated else {
        // Lost a race with a concurrent transition on the same order.
        return Err(StoreError::invalid_transition("order", order_id, from, to));
    };

    // Cancelling an order that had already been paid voids its not-yet-
    // approved commissions in the same transaction. Approved or paid-out
    // commissions are left for manual clawback.
    if to == OrderStatus::Cancelled && from == OrderStatus::Paid {
        let voided = sqlx::query(
            "UPDATE commissions SET status = 'CANCELLED', updated_at = NOW() \
             WHERE order_id = $1 AND status = 'PENDING'",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        if voided.rows_affected() > 0 {
            tracing::info!(
                order_id = %order_id,
                count = voided.rows_affected(),
                "pending commissions voided with cancelled order"
            );
        }
    }
    tx.commit().await?;

    let event = match to {
        OrderStatus::Shipped => OrderEvent::Shipped { order_id },
        OrderStatus::Delivered => OrderEvent::Delivered { order_id },
        OrderStatus::Cancelled => OrderEvent::Cancelled { order_id },
        _ => unreachable!("manual targets are limited above"),
    };
    state.events.publish(DomainEvent::Order(event)).await;
    Ok(updated)
}

#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub order_id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Applies the same guarded transition to every order independently. One
/// failure never rolls back or aborts the rest.
pub async fn bulk_transition(
    state: &AppState,
    order_ids: &[Uuid],
    to: OrderStatus,
) -> Vec<BulkOutcome> {
    let mut outcomes = Vec::with_capacity(order_ids.len());
    for &order_id in order_ids {
        let outcome = match transition_order(state, order_id, to).await {
            Ok(_) => BulkOutcome { order_id, ok: true, error: None },
            Err(e) => BulkOutcome {
                order_id,
                ok: false,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
    }
    outcomes
}
