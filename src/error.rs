//! Error taxonomy shared by the whole service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("product {sku} is out of stock (requested {requested}, available {available})")]
    OutOfStock {
        sku: String,
        requested: u32,
        available: i32,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("order not found")]
    OrderNotFound,

    #[error("payment signature mismatch")]
    SignatureMismatch,

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Builds an `InvalidTransition` for a request-driven rejection, logging
    /// the entity and both statuses. Illegal transitions are treated as
    /// security-relevant (tampering or replay probes), same as signature
    /// mismatches.
    pub fn invalid_transition(
        entity: &'static str,
        id: uuid::Uuid,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        let (from, to) = (from.to_string(), to.to_string());
        tracing::warn!(entity, id = %id, from = %from, to = %to, "status transition rejected");
        Self::InvalidTransition { from, to }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::OutOfStock { .. } => StatusCode::CONFLICT,
            Self::InvalidAddress(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::OrderNotFound | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::SignatureMismatch => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::InvalidAddress(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = StoreError::OutOfStock {
            sku: "RICE-5KG".into(),
            requested: 2,
            available: 1,
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(StoreError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(StoreError::SignatureMismatch.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_transition_keeps_statuses() {
        let err = StoreError::invalid_transition(
            "order",
            uuid::Uuid::new_v4(),
            "DELIVERED",
            "PENDING",
        );
        match err {
            StoreError::InvalidTransition { from, to } => {
                assert_eq!(from, "DELIVERED");
                assert_eq!(to, "PENDING");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_stock_names_product() {
        let err = StoreError::OutOfStock {
            sku: "rice-5kg".into(),
            requested: 2,
            available: 1,
        };
        assert!(err.to_string().contains("rice-5kg"));
    }
}
