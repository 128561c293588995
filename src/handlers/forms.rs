//! Form inquiries. Each form type has a fixed schema; the tagged union
//! keeps the admin viewer type-safe while letting different forms carry
//! different fields.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaginatedResponse;
use crate::error::{Result, StoreError};
use crate::models::FormSubmission;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form_type", rename_all = "snake_case")]
pub enum InquiryForm {
    Contact {
        name: String,
        email: String,
        message: String,
    },
    BulkOrder {
        company: String,
        email: String,
        phone: String,
        product: String,
        quantity: u32,
    },
    Distributor {
        company: String,
        email: String,
        phone: String,
        region: String,
    },
}

impl InquiryForm {
    pub fn form_type(&self) -> &'static str {
        match self {
            Self::Contact { .. } => "contact",
            Self::BulkOrder { .. } => "bulk_order",
            Self::Distributor { .. } => "distributor",
        }
    }
}

pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<InquiryForm>,
) -> Result<(StatusCode, Json<FormSubmission>)> {
    let payload = serde_json::to_value(&form)
        .map_err(|e| StoreError::BadRequest(e.to_string()))?;
    let submission = sqlx::query_as::<_, FormSubmission>(
        "INSERT INTO form_submissions (id, form_type, payload) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(form.form_type())
    .bind(&payload)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Debug, Deserialize)]
pub struct FormFilters {
    pub form_type: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<FormFilters>,
) -> Result<Json<PaginatedResponse<FormSubmission>>> {
    let page = filters.page.unwrap_or(1).max(1);
    let per_page = filters.per_page.unwrap_or(20).min(100);
    let submissions = sqlx::query_as::<_, FormSubmission>(
        "SELECT * FROM form_submissions \
         WHERE ($1::text IS NULL OR form_type = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&filters.form_type)
    .bind(per_page as i64)
    .bind(super::page_offset(page, per_page))
    .fetch_all(&state.db)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM form_submissions WHERE ($1::text IS NULL OR form_type = $1)",
    )
    .bind(&filters.form_type)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(PaginatedResponse {
        data: submissions,
        total,
        page,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_form_round_trip() {
        let json = serde_json::json!({
            "form_type": "contact",
            "name": "Asha",
            "email": "asha@example.com",
            "message": "Do you ship to Goa?"
        });
        let form: InquiryForm = serde_json::from_value(json).unwrap();
        assert_eq!(form.form_type(), "contact");
    }

    #[test]
    fn test_bulk_order_fields() {
        let json = serde_json::json!({
            "form_type": "bulk_order",
            "company": "Hotel Annapurna",
            "email": "purchasing@annapurna.example",
            "phone": "08012345678",
            "product": "Sona Masoori 25kg",
            "quantity": 40
        });
        let form: InquiryForm = serde_json::from_value(json).unwrap();
        match form {
            InquiryForm::BulkOrder { quantity, .. } => assert_eq!(quantity, 40),
            other => panic!("expected bulk_order, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_form_type_rejected() {
        let json = serde_json::json!({"form_type": "mystery,", "field": 1});
        assert!(serde_json::from_value::<InquiryForm>(json).is_err());
    }
}
