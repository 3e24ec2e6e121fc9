//! Razorpay orders API and checkout signature verification

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

use crate::models::Booking;
use crate::pricing::to_minor_units;

use super::PaymentError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub api_base: String,
    pub key_id: String,
    pub key_secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
    notes: OrderNotes,
}

#[derive(Debug, Serialize)]
struct OrderNotes {
    booking_id: String,
}

/// Order returned by `POST /orders`
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

pub struct RazorpayGateway {
    client: reqwest::Client,
    config: RazorpayConfig,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Create an order for the booking total
    pub async fn create_order(&self, booking: &Booking) -> Result<RazorpayOrder, PaymentError> {
        let amount = to_minor_units(booking.total_amount)
            .ok_or_else(|| PaymentError::Malformed("booking total out of range".to_string()))?;

        let response = self
            .client
            .post(format!("{}/orders", self.config.api_base.trim_end_matches('/')))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderRequest {
                amount,
                currency: &booking.currency,
                receipt: booking.id.simple().to_string(),
                notes: OrderNotes {
                    booking_id: booking.id.to_string(),
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let order: RazorpayOrder = response.json().await?;
        if order.amount != amount {
            return Err(PaymentError::AmountMismatch {
                expected: amount,
                paid: order.amount,
            });
        }
        Ok(order)
    }

    /// Check the `razorpay_signature` returned by checkout
    pub fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), PaymentError> {
        verify_checkout_signature(&self.config.key_secret, order_id, payment_id, signature)
    }
}

/// Signature = hex(HMAC-SHA256(key_secret, "<order_id>|<payment_id>"))
pub fn verify_checkout_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), PaymentError> {
    let signature = hex::decode(signature.trim()).map_err(|_| PaymentError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .map_err(|e| PaymentError::Malformed(e.to_string()))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());

    mac.verify_slice(&signature)
        .map_err(|_| PaymentError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";
    const ORDER: &str = "order_9A33XWu170gUtm";
    const PAYMENT: &str = "pay_29QQoUBi66xm2f";
    const SIGNATURE: &str = "a982c20f48234e966ccc8d903bff75730b34341007236ad8c8a9d7c0ae5848c5";

    #[test]
    fn test_valid_signature() {
        assert!(verify_checkout_signature(SECRET, ORDER, PAYMENT, SIGNATURE).is_ok());
        // Uppercase hex is still the same bytes
        assert!(
            verify_checkout_signature(SECRET, ORDER, PAYMENT, &SIGNATURE.to_uppercase()).is_ok()
        );
    }

    #[test]
    fn test_tampered_signature() {
        let mut tampered = SIGNATURE.to_string();
        tampered.replace_range(0..2, "00");
        assert!(matches!(
            verify_checkout_signature(SECRET, ORDER, PAYMENT, &tampered),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_signature_bound_to_order_and_payment() {
        assert!(verify_checkout_signature(SECRET, "order_other", PAYMENT, SIGNATURE).is_err());
        assert!(verify_checkout_signature(SECRET, ORDER, "pay_other", SIGNATURE).is_err());
        assert!(verify_checkout_signature("other_secret", ORDER, PAYMENT, SIGNATURE).is_err());
    }

    #[test]
    fn test_non_hex_signature() {
        assert!(matches!(
            verify_checkout_signature(SECRET, ORDER, PAYMENT, "not-hex"),
            Err(PaymentError::InvalidSignature)
        ));
    }
}
