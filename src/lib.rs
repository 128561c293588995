//! Grainhouse Commerce - storefront backend
//!
//! Backend for a rice and food-products shop.
//!
//! ## Features
//! - Product catalog with stock tracking
//! - Checkout against a hosted payment-gateway widget
//! - Server-side payment signature verification
//! - Multi-level referral commissions
//! - Order and commission status lifecycles with admin bulk updates
//! - Customer address book
//! - Typed form inquiries

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

pub use error::{Result, StoreError};
