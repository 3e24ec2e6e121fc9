//! WhatsApp Cloud API template messages

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::{BookingConfirmation, NotifyError, Notifier};

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_base: String,
    pub token: String,
    pub phone_number_id: String,
    pub otp_template: String,
    pub booking_template: String,
    pub language: String,
}

pub struct WhatsAppNotifier {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.phone_number_id
        )
    }

    async fn send(&self, payload: Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Authentication template: code goes in the body and the copy-code button
pub fn otp_message(config: &WhatsAppConfig, phone: &str, code: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": phone.trim_start_matches('+'),
        "type": "template",
        "template": {
            "name": config.otp_template,
            "language": { "code": config.language },
            "components": [
                {
                    "type": "body",
                    "parameters": [{ "type": "text", "text": code }]
                },
                {
                    "type": "button",
                    "sub_type": "url",
                    "index": "0",
                    "parameters": [{ "type": "text", "text": code }]
                }
            ]
        }
    })
}

pub fn booking_message(
    config: &WhatsAppConfig,
    phone: &str,
    confirmation: &BookingConfirmation,
) -> Value {
    let text = |value: String| json!({ "type": "text", "text": value });
    json!({
        "messaging_product": "whatsapp",
        "to": phone.trim_start_matches('+'),
        "type": "template",
        "template": {
            "name": config.booking_template,
            "language": { "code": config.language },
            "components": [{
                "type": "body",
                "parameters": [
                    text(confirmation.guest_name.clone()),
                    text(confirmation.property_name.clone()),
                    text(confirmation.check_in.format("%d %b %Y").to_string()),
                    text(confirmation.check_out.format("%d %b %Y").to_string()),
                    text(format!("{} {}", confirmation.currency, confirmation.total)),
                    text(confirmation.booking_id.simple().to_string()),
                ]
            }]
        }
    })
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<(), NotifyError> {
        self.send(otp_message(&self.config, phone, code)).await
    }

    async fn send_booking_confirmation(
        &self,
        phone: &str,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotifyError> {
        self.send(booking_message(&self.config, phone, confirmation))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn config() -> WhatsAppConfig {
        WhatsAppConfig {
            api_base: "https://graph.facebook.com/v18.0/".to_string(),
            token: "token".to_string(),
            phone_number_id: "1234".to_string(),
            otp_template: "login_code".to_string(),
            booking_template: "booking_confirmed".to_string(),
            language: "en".to_string(),
        }
    }

    #[test]
    fn test_messages_url() {
        let notifier = WhatsAppNotifier::new(config()).unwrap();
        assert_eq!(
            notifier.messages_url(),
            "https://graph.facebook.com/v18.0/1234/messages"
        );
    }

    #[test]
    fn test_otp_message_payload() {
        let payload = otp_message(&config(), "+919876543210", "482913");
        assert_eq!(payload["to"], "919876543210");
        assert_eq!(payload["template"]["name"], "login_code");
        assert_eq!(
            payload["template"]["components"][0]["parameters"][0]["text"],
            "482913"
        );
        assert_eq!(payload["template"]["components"][1]["sub_type"], "url");
    }

    #[test]
    fn test_booking_message_payload() {
        let confirmation = BookingConfirmation {
            booking_id: Uuid::nil(),
            guest_name: "Asha".to_string(),
            property_name: "Casa Azul".to_string(),
            check_in: NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 2, 18).unwrap(),
            total: dec!(20832),
            currency: "INR".to_string(),
        };
        let payload = booking_message(&config(), "+919876543210", &confirmation);
        let params = &payload["template"]["components"][0]["parameters"];

        assert_eq!(params[0]["text"], "Asha");
        assert_eq!(params[2]["text"], "15 Feb 2025");
        assert_eq!(params[3]["text"], "18 Feb 2025");
        assert_eq!(params[4]["text"], "INR 20832");
    }
}
