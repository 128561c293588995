//! Commission engine: walks the purchaser's referral ancestry and credits
//! each level according to the active schedule.

use sqlx::{Postgres, Transaction};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::aggregates::{
    plan_credits, CommissionKind, CommissionSchedule, LevelSetting,
};
use crate::domain::events::CommissionEvent;
use crate::domain::value_objects::Money;
use crate::error::Result;
use crate::models;

/// Runs once per order, on its first PENDING -> PAID transition (guaranteed
/// by the caller's conditional update). The unique (order, recipient, level)
/// index makes the inserts a no-op on any replay that slips through.
///
/// Runs inside the caller's settlement transaction; the returned events are
/// for publishing after that transaction commits.
pub async fn credit_for_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &models::Order,
) -> Result<Vec<CommissionEvent>> {
    let Some(purchaser) = order.user_id else {
        return Ok(vec![]); // guest checkout: nobody to credit
    };

    let settings =
        sqlx::query_as::<_, models::CommissionSetting>("SELECT * FROM commission_settings")
            .fetch_all(&mut **tx)
            .await?;
    let schedule = CommissionSchedule::from_settings(settings.into_iter().map(|s| LevelSetting {
        level: s.level.max(0) as u32,
        percentage: s.percentage,
        is_active: s.is_active,
        updated_at: s.updated_at,
    }));
    if schedule.is_empty() {
        return Ok(vec![]);
    }

    let ancestors = referral_ancestors(tx, purchaser, schedule.max_level()).await?;
    let total = Money::new(order.total, &order.currency);
    let credits = plan_credits(&schedule, &total, &ancestors);

    let mut events = Vec::with_capacity(credits.len());
    for credit in credits {
        let inserted = sqlx::query(
            "INSERT INTO commissions (id, order_id, recipient_id, from_user_id, level, amount, kind, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING') \
             ON CONFLICT (order_id, recipient_id, level) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(credit.recipient_id)
        .bind(purchaser)
        .bind(credit.level as i32)
        .bind(credit.amount)
        .bind(CommissionKind::Referral)
        .execute(&mut **tx)
        .await?;

        if inserted.rows_affected() > 0 {
            events.push(CommissionEvent::Credited {
                order_id: order.id,
                recipient_id: credit.recipient_id,
                level: credit.level,
                amount: credit.amount,
            });
        }
    }
    Ok(events)
}

/// Walks `referred_by` upward from (not including) `purchaser`, at most
/// `max_levels` steps. The bound and the seen-set keep the walk finite even
/// if a data bug ever produced a referral cycle.
async fn referral_ancestors(
    tx: &mut Transaction<'_, Postgres>,
    purchaser: Uuid,
    max_levels: u32,
) -> Result<Vec<Uuid>> {
    let mut ancestors = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::from([purchaser]);
    let mut current = purchaser;

    for _ in 0..max_levels {
        let referrer: Option<(Option<Uuid>,)> =
            sqlx::query_as("SELECT referred_by FROM users WHERE id = $1")
                .bind(current)
                .fetch_optional(&mut **tx)
                .await?;
        let Some((Some(next),)) = referrer else {
            break;
        };
        if !seen.insert(next) {
            tracing::warn!(user_id = %next, "referral cycle detected, stopping walk");
            break;
        }
        ancestors.push(next);
        current = next;
    }
    Ok(ancestors)
}
