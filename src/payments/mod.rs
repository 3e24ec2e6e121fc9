//! Payment gateways (Razorpay, PhonePe) and payment confirmation.
//!
//! Gateways only shape requests and verify what comes back; booking state
//! changes go through `booking::services`.

pub mod phonepe;
pub mod razorpay;
pub mod routes;

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::PaymentProvider;

pub use phonepe::{PhonePeConfig, PhonePeGateway};
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use routes::router;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payments via {0} are not enabled")]
    NotConfigured(PaymentProvider),

    #[error("Payment signature verification failed")]
    InvalidSignature,

    #[error("Malformed payment data: {0}")]
    Malformed(String),

    #[error("Paid amount {paid} does not match booking total {expected} (minor units)")]
    AmountMismatch { expected: i64, paid: i64 },

    #[error("Payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Payment gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },
}

/// What the client needs to open the provider's checkout
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum CheckoutSession {
    Razorpay {
        booking_id: Uuid,
        key_id: String,
        order_id: String,
        amount: i64,
        currency: String,
    },
    PhonePe {
        booking_id: Uuid,
        merchant_transaction_id: String,
        redirect_url: String,
    },
}

/// Configured gateways; an absent gateway rejects checkouts with `NotConfigured`
#[derive(Clone, Default)]
pub struct PaymentGateways {
    pub razorpay: Option<Arc<RazorpayGateway>>,
    pub phonepe: Option<Arc<PhonePeGateway>>,
}

impl PaymentGateways {
    pub fn razorpay(&self) -> Result<&RazorpayGateway, PaymentError> {
        self.razorpay
            .as_deref()
            .ok_or(PaymentError::NotConfigured(PaymentProvider::Razorpay))
    }

    pub fn phonepe(&self) -> Result<&PhonePeGateway, PaymentError> {
        self.phonepe
            .as_deref()
            .ok_or(PaymentError::NotConfigured(PaymentProvider::PhonePe))
    }
}

/// Byte comparison whose running time does not depend on where inputs differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
