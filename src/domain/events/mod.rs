//! Domain events, published best-effort after state changes commit.
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Commission(CommissionEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, total: Decimal },
    Paid { order_id: Uuid, total: Decimal },
    Shipped { order_id: Uuid },
    Delivered { order_id: Uuid },
    Cancelled { order_id: Uuid },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CommissionEvent {
    Credited {
        order_id: Uuid,
        recipient_id: Uuid,
        level: u32,
        amount: Decimal,
    },
}

impl DomainEvent {
    /// NATS subject the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "grainhouse.order.placed",
            Self::Order(OrderEvent::Paid { .. }) => "grainhouse.order.paid",
            Self::Order(OrderEvent::Shipped { .. }) => "grainhouse.order.shipped",
            Self::Order(OrderEvent::Delivered { .. }) => "grainhouse.order.delivered",
            Self::Order(OrderEvent::Cancelled { .. }) => "grainhouse.order.cancelled",
            Self::Commission(CommissionEvent::Credited { .. }) => "grainhouse.commission.credited",
        }
    }
}
