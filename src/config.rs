//! Environment-driven configuration, read once at startup.

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allow_guest_checkout: bool,
    pub nats_url: Option<String>,
    pub gateway: GatewayConfig,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8083".to_string())
                .parse()
                .context("PORT must be a number")?,
            allow_guest_checkout: std::env::var("ALLOW_GUEST_CHECKOUT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            nats_url: std::env::var("NATS_URL").ok(),
            gateway: GatewayConfig {
                base_url: std::env::var("GATEWAY_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
                key_id: std::env::var("GATEWAY_KEY_ID").context("GATEWAY_KEY_ID is required")?,
                key_secret: std::env::var("GATEWAY_KEY_SECRET")
                    .context("GATEWAY_KEY_SECRET is required")?,
                currency: std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            },
        })
    }
}
