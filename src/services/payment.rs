//! Payment verification: signature check, idempotent PENDING -> PAID
//! transition, stock decrement, commission crediting.

use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::error::{Result, StoreError};
use crate::models;
use crate::services::commission;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

/// Verifies a gateway callback and settles the order.
///
/// Safe to call twice with identical inputs: the PAID transition is a single
/// conditional UPDATE, and only the call that wins it decrements stock and
/// credits commissions. The loser observes the already-PAID order and
/// returns it unchanged.
///
/// Settlement is one transaction: the PAID transition, the stock decrements
/// and the commission rows all commit together, so a crash mid-settlement
/// rolls the order back to PENDING and a retry redoes the whole settlement
/// rather than finding a half-settled PAID order.
pub async fn verify_payment(state: &AppState, req: VerifyPaymentRequest) -> Result<models::Order> {
    let order = sqlx::query_as::<_, models::Order>("SELECT * FROM orders WHERE id = $1")
        .bind(req.order_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(StoreError::OrderNotFound)?;

    if order.gateway_order_id != req.gateway_order_id {
        tracing::warn!(
            order_id = %req.order_id,
            supplied_gateway_order = %req.gateway_order_id,
            "gateway order id does not match stored order"
        );
        return Err(StoreError::OrderNotFound);
    }

    if let Err(e) = state.gateway.verify_signature(
        &req.gateway_order_id,
        &req.gateway_payment_id,
        &req.gateway_signature,
    ) {
        tracing::warn!(
            order_id = %req.order_id,
            gateway_order_id = %req.gateway_order_id,
            gateway_payment_id = %req.gateway_payment_id,
            "payment signature mismatch"
        );
        return Err(e);
    }

    let mut tx = state.db.begin().await?;

    // Atomic idempotency guard: only one caller can move PENDING to PAID.
    let settled = sqlx::query_as::<_, models::Order>(
        "UPDATE orders SET status = 'PAID', gateway_payment_id = $2, updated_at = NOW() \
         WHERE id = $1 AND status = 'PENDING' RETURNING *",
    )
    .bind(order.id)
    .bind(&req.gateway_payment_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(settled) = settled else {
        drop(tx);
        let current = sqlx::query_as::<_, models::Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order.id)
            .fetch_one(&state.db)
            .await?;
        if current.status == OrderStatus::Paid {
            tracing::info!(order_id = %order.id, "verification replay on settled order");
            return Ok(current);
        }
        return Err(StoreError::invalid_transition(
            "order",
            order.id,
            current.status,
            OrderStatus::Paid,
        ));
    };

    decrement_stock(&mut tx, settled.id).await?;
    let credited = commission::credit_for_order(&mut tx, &settled).await?;
    tx.commit().await?;

    for event in credited {
        state.events.publish(DomainEvent::Commission(event)).await;
    }
    state
        .events
        .publish(DomainEvent::Order(OrderEvent::Paid {
            order_id: settled.id,
            total: settled.total,
        }))
        .await;
    tracing::info!(order_id = %settled.id, total = %settled.total, "order paid");
    Ok(settled)
}

/// Decrements stock for every line of a freshly paid order. A verified
/// payment is never failed over a stock race: a decrement that lands
/// negative flags the line and product for backorder handling instead.
async fn decrement_stock(tx: &mut Transaction<'_, Postgres>, order_id: Uuid) -> Result<()> {
    let items =
        sqlx::query_as::<_, models::OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await?;

    for item in items {
        let (remaining,): (i32,) = sqlx::query_as(
            "UPDATE products SET stock = stock - $2, backordered = stock - $2 < 0, \
             updated_at = NOW() WHERE id = $1 RETURNING stock",
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .fetch_one(&mut **tx)
        .await?;

        if remaining < 0 {
            sqlx::query("UPDATE order_items SET backordered = TRUE WHERE id = $1")
                .bind(item.id)
                .execute(&mut **tx)
                .await?;
            tracing::warn!(
                order_id = %order_id,
                product_id = %item.product_id,
                remaining,
                "stock went negative on paid order, line flagged for backorder"
            );
        }
    }
    Ok(())
}
