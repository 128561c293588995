//! Order aggregate and the status transition table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;
use crate::error::StoreError;

/// The five order states. The only legal moves are the ones `allows`
/// enumerates; both the payment-verification auto-transition and the admin
/// manual paths consult this one table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn allows(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Paid)
                | (Paid, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Paid, Cancelled)
        )
    }

    pub fn transition(self, to: OrderStatus) -> Result<OrderStatus, StoreError> {
        if self.allows(to) {
            Ok(to)
        } else {
            Err(StoreError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Shipping address copied into the order at creation. Later edits to the
/// customer's address book never alter historical orders.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub name: String,
    pub company: Option<String>,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    order_number: String,
    user_id: Option<Uuid>,
    email: String,
    status: OrderStatus,
    items: Vec<OrderLine>,
    total: Money,
    shipping: AddressSnapshot,
    gateway_order_id: String,
    gateway_payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Order {
    /// Builds a new PENDING order from already-priced lines. The total is
    /// computed here, once, from the price snapshots and never recomputed.
    pub fn place(
        user_id: Option<Uuid>,
        email: impl Into<String>,
        items: Vec<OrderLine>,
        shipping: AddressSnapshot,
        currency: &str,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let total = items.iter().fold(Money::zero(currency), |acc, line| {
            acc.add(&line.line_total()).unwrap_or(acc)
        });
        let order_number = format!("ORD-{:08}", rand::random::<u32>() % 100_000_000);
        let mut order = Self {
            id,
            order_number,
            user_id,
            email: email.into(),
            status: OrderStatus::Pending,
            items,
            total,
            shipping,
            gateway_order_id: String::new(),
            gateway_payment_id: None,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise(DomainEvent::Order(OrderEvent::Placed {
            order_id: id,
            total: order.total.amount(),
        }));
        order
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn order_number(&self) -> &str {
        &self.order_number
    }
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn status(&self) -> OrderStatus {
        self.status
    }
    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }
    pub fn total(&self) -> &Money {
        &self.total
    }
    pub fn shipping(&self) -> &AddressSnapshot {
        &self.shipping
    }
    pub fn gateway_order_id(&self) -> &str {
        &self.gateway_order_id
    }
    pub fn gateway_payment_id(&self) -> Option<&str> {
        self.gateway_payment_id.as_deref()
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn attach_gateway_order(&mut self, gateway_order_id: impl Into<String>) {
        self.gateway_order_id = gateway_order_id.into();
        self.touch();
    }

    pub fn mark_paid(&mut self, gateway_payment_id: impl Into<String>) -> Result<(), StoreError> {
        self.status = self.status.transition(OrderStatus::Paid)?;
        self.gateway_payment_id = Some(gateway_payment_id.into());
        self.touch();
        self.raise(DomainEvent::Order(OrderEvent::Paid {
            order_id: self.id,
            total: self.total.amount(),
        }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_address() -> AddressSnapshot {
        AddressSnapshot {
            name: "Asha Rao".into(),
            company: None,
            line1: "14 Mill Road".into(),
            line2: None,
            city: "Mysuru".into(),
            state: "KA".into(),
            zip: "570001".into(),
            country: "IN".into(),
            phone: Some("9876543210".into()),
        }
    }

    fn sample_order() -> Order {
        Order::place(
            None,
            "asha@example.com",
            vec![OrderLine {
                product_id: Uuid::new_v4(),
                name: "Sona Masoori 5kg".into(),
                unit_price: Money::inr(dec!(500)),
                quantity: 2,
            }],
            sample_address(),
            "INR",
        )
    }

    #[test]
    fn test_total_is_sum_of_line_snapshots() {
        let order = sample_order();
        assert_eq!(order.total().amount(), dec!(1000.00));
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_happy_path_transitions() {
        let s = OrderStatus::Pending;
        let s = s.transition(OrderStatus::Paid).unwrap();
        let s = s.transition(OrderStatus::Shipped).unwrap();
        let s = s.transition(OrderStatus::Delivered).unwrap();
        assert_eq!(s, OrderStatus::Delivered);
    }

    #[test]
    fn test_cancel_only_before_shipping() {
        assert!(OrderStatus::Pending.allows(OrderStatus::Cancelled));
        assert!(OrderStatus::Paid.allows(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.allows(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.allows(OrderStatus::Cancelled));
    }

    #[test]
    fn test_illegal_transition_leaves_state() {
        let err = OrderStatus::Delivered
            .transition(OrderStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let mut order = sample_order();
        order.mark_paid("pay_1").unwrap();
        // Second mark_paid must fail and keep the PAID state.
        assert!(order.mark_paid("pay_2").is_err());
        assert_eq!(order.status(), OrderStatus::Paid);
    }

    #[test]
    fn test_paid_raises_event() {
        let mut order = sample_order();
        order.mark_paid("pay_1").unwrap();
        let events = order.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, DomainEvent::Order(OrderEvent::Paid { .. }))));
    }
}
