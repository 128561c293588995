//! Shared application state and the session extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::events::DomainEvent;
use crate::gateway::Gateway;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: Gateway,
    pub events: EventPublisher,
    pub allow_guest_checkout: bool,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: &Config, nats: Option<async_nats::Client>) -> Self {
        Self {
            db,
            gateway: Gateway::new(config.gateway.clone()),
            events: EventPublisher {
                nats: Arc::new(nats),
            },
            allow_guest_checkout: config.allow_guest_checkout,
        }
    }
}

/// Publishes domain events to NATS when configured, otherwise just logs
/// them. Delivery is best-effort; a publish failure never fails the request
/// that produced the event.
#[derive(Clone)]
pub struct EventPublisher {
    nats: Arc<Option<async_nats::Client>>,
}

impl EventPublisher {
    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        tracing::info!(subject, event = ?event, "domain event");
        if let Some(client) = self.nats.as_ref() {
            match serde_json::to_vec(&event) {
                Ok(bytes) => {
                    if let Err(e) = client.publish(subject, bytes.into()).await {
                        tracing::warn!(subject, error = %e, "event publish failed");
                    }
                }
                Err(e) => tracing::warn!(subject, error = %e, "event serialize failed"),
            }
        }
    }

    pub async fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event).await;
        }
    }
}

/// Current user as supplied by the auth layer in front of this service.
/// `None` means guest.
#[derive(Clone, Copy, Debug)]
pub struct SessionUser(pub Option<Uuid>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());
        Ok(SessionUser(user))
    }
}
