//! HTTP handlers, grouped per resource. Routing is assembled here.
//!
//! Authentication and role checks happen upstream of this service; handlers
//! trust the `x-user-id` header the auth proxy injects (see `SessionUser`).

use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub mod addresses;
pub mod commissions;
pub mod forms;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settings;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).min(100)
    }
    pub fn offset(&self) -> i64 {
        // page is unbounded client input; widen before multiplying.
        (self.page() as i64 - 1) * self.per_page() as i64
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

/// Overflow-safe offset for the handlers that take their own filter structs.
pub(crate) fn page_offset(page: u32, per_page: u32) -> i64 {
    (page as i64 - 1) * per_page as i64
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async {
                Json(serde_json::json!({"status": "healthy", "service": "grainhouse-commerce"}))
            }),
        )
        .route("/api/v1/products", get(products::list))
        .route("/api/v1/products/:id", get(products::get_one))
        .route("/api/v1/checkout", post(orders::checkout))
        .route("/api/v1/orders", get(orders::list_mine))
        .route("/api/v1/orders/:id", get(orders::get_one))
        .route("/api/v1/payments/verify", post(payments::verify))
        .route(
            "/api/v1/addresses",
            get(addresses::list).post(addresses::create),
        )
        .route(
            "/api/v1/addresses/:id",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/api/v1/addresses/:id/default", post(addresses::set_default))
        .route("/api/v1/commissions", get(commissions::list_mine))
        .route("/api/v1/forms", post(forms::submit))
        .route(
            "/api/v1/admin/products",
            get(products::list_all).post(products::create),
        )
        .route(
            "/api/v1/admin/products/:id",
            put(products::update).delete(products::delete),
        )
        .route("/api/v1/admin/products/:id/stock", post(products::adjust_stock))
        .route("/api/v1/admin/orders", get(orders::list_all))
        .route("/api/v1/admin/orders/:id/status", patch(orders::update_status))
        .route("/api/v1/admin/orders/bulk-status", post(orders::bulk_status))
        .route("/api/v1/admin/commissions", get(commissions::list_all))
        .route(
            "/api/v1/admin/commissions/:id/status",
            patch(commissions::update_status),
        )
        .route(
            "/api/v1/admin/commissions/bulk-status",
            post(commissions::bulk_status),
        )
        .route(
            "/api/v1/admin/settings/commissions",
            get(settings::list).put(settings::upsert),
        )
        .route("/api/v1/admin/forms", get(forms::list))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_page_does_not_overflow() {
        let params = ListParams {
            page: Some(u32::MAX),
            per_page: Some(100),
            search: None,
        };
        assert_eq!(params.offset(), (u32::MAX as i64 - 1) * 100);
        assert_eq!(page_offset(u32::MAX, 100), (u32::MAX as i64 - 1) * 100);
    }

    #[test]
    fn test_first_page_offset_zero() {
        let params = ListParams { page: None, per_page: None, search: None };
        assert_eq!(params.offset(), 0);
        assert_eq!(params.per_page(), 20);
    }
}
