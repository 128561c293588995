//! Application services orchestrating the domain layer over storage and the
//! payment gateway.

pub mod checkout;
pub mod commission;
pub mod lifecycle;
pub mod payment;
