//! Payment gateway adapter.
//!
//! Two server-side responsibilities: opening a gateway order for a checkout
//! amount, and recomputing the callback signature so a forged or tampered
//! payment confirmation is rejected before it can touch order state. The
//! hosted checkout widget itself runs client-side and is not modelled here.

use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use sha2::Sha256;

use crate::config::GatewayConfig;
use crate::error::{Result, StoreError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

/// Handle returned by the gateway's create-order call; forwarded to the
/// client so it can open the hosted checkout widget.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Opens a gateway order for `amount` (major units, 2dp). The gateway
    /// API takes minor units.
    pub async fn create_order(&self, amount: Decimal, receipt: &str) -> Result<GatewayOrder> {
        let minor = (amount * dec!(100))
            .round()
            .to_i64()
            .ok_or_else(|| StoreError::Gateway("amount out of range".into()))?;
        let body = serde_json::json!({
            "amount": minor,
            "currency": self.config.currency,
            "receipt": receipt,
        });
        let response = self
            .http
            .post(format!("{}/orders", self.config.base_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Gateway(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StoreError::Gateway(format!(
                "create order returned {}",
                response.status()
            )));
        }
        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| StoreError::Gateway(e.to_string()))
    }

    /// Checks the callback signature: hex(HMAC-SHA256(secret, "order|payment")).
    /// Comparison is constant-time via the Mac verifier.
    pub fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<()> {
        let supplied = hex::decode(signature).map_err(|_| StoreError::SignatureMismatch)?;
        let mut mac = HmacSha256::new_from_slice(self.config.key_secret.as_bytes())
            .map_err(|e| StoreError::Gateway(e.to_string()))?;
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(gateway_payment_id.as_bytes());
        mac.verify_slice(&supplied)
            .map_err(|_| StoreError::SignatureMismatch)
    }
}

/// Produces the signature the gateway would send for a payment. Used by the
/// test client and by integration fixtures.
pub fn sign(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gateway() -> Gateway {
        Gateway::new(GatewayConfig {
            base_url: "http://localhost:0".into(),
            key_id: "key_test".into(),
            key_secret: "secret_test".into(),
            currency: "INR".into(),
        })
    }

    #[test]
    fn test_valid_signature_accepted() {
        let gw = test_gateway();
        let sig = sign("secret_test", "order_abc", "pay_xyz");
        assert!(gw.verify_signature("order_abc", "pay_xyz", &sig).is_ok());
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let gw = test_gateway();
        let sig = sign("secret_test", "order_abc", "pay_xyz");
        let err = gw
            .verify_signature("order_abc", "pay_other", &sig)
            .unwrap_err();
        assert!(matches!(err, StoreError::SignatureMismatch));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let gw = test_gateway();
        let sig = sign("another_secret", "order_abc", "pay_xyz");
        assert!(matches!(
            gw.verify_signature("order_abc", "pay_xyz", &sig),
            Err(StoreError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        let gw = test_gateway();
        assert!(matches!(
            gw.verify_signature("order_abc", "pay_xyz", "not-hex!"),
            Err(StoreError::SignatureMismatch)
        ));
    }
}
