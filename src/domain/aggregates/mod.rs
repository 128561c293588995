//! Aggregates module
pub mod cart;
pub mod commission;
pub mod order;

pub use cart::{Cart, CartError, CartLine};
pub use commission::{
    plan_credits, CommissionKind, CommissionSchedule, CommissionStatus, LevelSetting, PlannedCredit,
};
pub use order::{AddressSnapshot, Order, OrderLine, OrderStatus};
