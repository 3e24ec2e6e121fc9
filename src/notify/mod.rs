//! Outbound messaging: OTP delivery and booking confirmations.

mod whatsapp;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub use whatsapp::{WhatsAppConfig, WhatsAppNotifier};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Messaging request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Messaging API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Details rendered into the booking confirmation message
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub guest_name: String,
    pub property_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total: Decimal,
    pub currency: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<(), NotifyError>;

    async fn send_booking_confirmation(
        &self,
        phone: &str,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotifyError>;
}

/// Development notifier: writes messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<(), NotifyError> {
        tracing::info!(phone, code, "Messaging not configured; OTP logged instead of sent");
        Ok(())
    }

    async fn send_booking_confirmation(
        &self,
        phone: &str,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            phone,
            booking_id = %confirmation.booking_id,
            "Messaging not configured; booking confirmation logged instead of sent"
        );
        Ok(())
    }
}
