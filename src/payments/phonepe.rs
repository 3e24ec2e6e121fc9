//! PhonePe standard checkout (pay page) and server callback verification

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::models::Booking;
use crate::pricing::to_minor_units;

use super::{constant_time_eq, PaymentError};

const PAY_ENDPOINT: &str = "/pg/v1/pay";

/// Callback `code` for a captured payment
pub const PAYMENT_SUCCESS: &str = "PAYMENT_SUCCESS";

#[derive(Debug, Clone)]
pub struct PhonePeConfig {
    pub base_url: String,
    pub merchant_id: String,
    pub salt_key: String,
    pub salt_index: String,
    /// Where the customer's browser returns after paying
    pub redirect_url: String,
    /// Server-to-server callback endpoint
    pub callback_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayPayload<'a> {
    merchant_id: &'a str,
    merchant_transaction_id: &'a str,
    merchant_user_id: String,
    amount: i64,
    redirect_url: &'a str,
    redirect_mode: &'a str,
    callback_url: &'a str,
    payment_instrument: PaymentInstrument,
}

#[derive(Debug, Serialize)]
struct PaymentInstrument {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone)]
pub struct PhonePeCheckout {
    pub merchant_transaction_id: String,
    pub redirect_url: String,
}

/// Decoded `response` of a server callback
#[derive(Debug, Clone, Deserialize)]
pub struct PhonePeCallback {
    pub success: bool,
    pub code: String,
    pub data: CallbackData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackData {
    pub merchant_transaction_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub amount: i64,
}

impl PhonePeCallback {
    pub fn is_paid(&self) -> bool {
        self.success && self.code == PAYMENT_SUCCESS
    }
}

pub struct PhonePeGateway {
    client: reqwest::Client,
    config: PhonePeConfig,
}

impl PhonePeGateway {
    pub fn new(config: PhonePeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    /// Start a pay-page session for the booking total
    pub async fn create_payment(&self, booking: &Booking) -> Result<PhonePeCheckout, PaymentError> {
        let amount = to_minor_units(booking.total_amount)
            .ok_or_else(|| PaymentError::Malformed("booking total out of range".to_string()))?;
        let merchant_transaction_id = Uuid::new_v4().simple().to_string();

        let payload = PayPayload {
            merchant_id: &self.config.merchant_id,
            merchant_transaction_id: &merchant_transaction_id,
            merchant_user_id: booking.user_id.simple().to_string(),
            amount,
            redirect_url: &self.config.redirect_url,
            redirect_mode: "POST",
            callback_url: &self.config.callback_url,
            payment_instrument: PaymentInstrument { kind: "PAY_PAGE" },
        };
        let encoded = STANDARD.encode(
            serde_json::to_vec(&payload).map_err(|e| PaymentError::Malformed(e.to_string()))?,
        );

        let response = self
            .client
            .post(format!(
                "{}{}",
                self.config.base_url.trim_end_matches('/'),
                PAY_ENDPOINT
            ))
            .header(
                "X-VERIFY",
                request_checksum(&encoded, PAY_ENDPOINT, &self.config.salt_key, &self.config.salt_index),
            )
            .json(&serde_json::json!({ "request": encoded }))
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

        let body: Value = response.json().await?;
        let redirect_url = body
            .pointer("/data/instrumentResponse/redirectInfo/url")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentError::Malformed("missing redirect url".to_string()))?
            .to_string();

        Ok(PhonePeCheckout {
            merchant_transaction_id,
            redirect_url,
        })
    }

    /// Verify `X-VERIFY` on a callback and decode its base64 `response`
    pub fn decode_callback(
        &self,
        x_verify: &str,
        response_b64: &str,
    ) -> Result<PhonePeCallback, PaymentError> {
        decode_callback(&self.config.salt_key, &self.config.salt_index, x_verify, response_b64)
    }
}

/// `sha256hex(payload + endpoint + salt_key) + "###" + salt_index`
pub fn request_checksum(payload_b64: &str, endpoint: &str, salt_key: &str, salt_index: &str) -> String {
    let digest = Sha256::digest(format!("{payload_b64}{endpoint}{salt_key}").as_bytes());
    format!("{}###{}", hex::encode(digest), salt_index)
}

/// `sha256hex(response + salt_key) + "###" + salt_index`
pub fn callback_checksum(response_b64: &str, salt_key: &str, salt_index: &str) -> String {
    let digest = Sha256::digest(format!("{response_b64}{salt_key}").as_bytes());
    format!("{}###{}", hex::encode(digest), salt_index)
}

pub fn decode_callback(
    salt_key: &str,
    salt_index: &str,
    x_verify: &str,
    response_b64: &str,
) -> Result<PhonePeCallback, PaymentError> {
    let expected = callback_checksum(response_b64, salt_key, salt_index);
    if !constant_time_eq(expected.as_bytes(), x_verify.trim().to_lowercase().as_bytes()) {
        return Err(PaymentError::InvalidSignature);
    }

    let decoded = STANDARD
        .decode(response_b64)
        .map_err(|e| PaymentError::Malformed(e.to_string()))?;
    serde_json::from_slice(&decoded).map_err(|e| PaymentError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT_KEY: &str = "salt-key";
    const SALT_INDEX: &str = "1";

    fn encoded_callback(code: &str, amount: i64) -> String {
        STANDARD.encode(
            serde_json::json!({
                "success": code == PAYMENT_SUCCESS,
                "code": code,
                "data": {
                    "merchantId": "M1",
                    "merchantTransactionId": "txn123",
                    "transactionId": "T2501011200",
                    "amount": amount
                }
            })
            .to_string(),
        )
    }

    #[test]
    fn test_request_checksum_known_value() {
        assert_eq!(
            request_checksum("eyJtZXJjaGFudElkIjoiTTEifQ==", PAY_ENDPOINT, SALT_KEY, SALT_INDEX),
            "399db80e530a9b40bdf0d238f169780f009bdb2434d1eb3d93ccddff2774aed0###1"
        );
    }

    #[test]
    fn test_decode_valid_callback() {
        let response = encoded_callback(PAYMENT_SUCCESS, 2_083_200);
        let x_verify = callback_checksum(&response, SALT_KEY, SALT_INDEX);

        let callback = decode_callback(SALT_KEY, SALT_INDEX, &x_verify, &response).unwrap();
        assert!(callback.is_paid());
        assert_eq!(callback.data.merchant_transaction_id, "txn123");
        assert_eq!(callback.data.amount, 2_083_200);
    }

    #[test]
    fn test_failed_payment_callback_is_not_paid() {
        let response = encoded_callback("PAYMENT_ERROR", 2_083_200);
        let x_verify = callback_checksum(&response, SALT_KEY, SALT_INDEX);

        let callback = decode_callback(SALT_KEY, SALT_INDEX, &x_verify, &response).unwrap();
        assert!(!callback.is_paid());
    }

    #[test]
    fn test_callback_with_bad_checksum_is_rejected() {
        let response = encoded_callback(PAYMENT_SUCCESS, 2_083_200);
        let forged = callback_checksum(&response, "wrong-salt", SALT_INDEX);

        assert!(matches!(
            decode_callback(SALT_KEY, SALT_INDEX, &forged, &response),
            Err(PaymentError::InvalidSignature)
        ));
    }

    #[test]
    fn test_callback_body_tampering_is_detected() {
        let response = encoded_callback(PAYMENT_SUCCESS, 2_083_200);
        let x_verify = callback_checksum(&response, SALT_KEY, SALT_INDEX);
        let tampered = encoded_callback(PAYMENT_SUCCESS, 100);

        assert!(decode_callback(SALT_KEY, SALT_INDEX, &x_verify, &tampered).is_err());
    }
}
