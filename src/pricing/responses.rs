//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::StayPrice;

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Response for a stay quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub property_id: Uuid,
    pub nights: i64,
    pub nightly_rate: MoneyResponse,
    pub subtotal: MoneyResponse,
    pub service_fee: MoneyResponse,
    pub pet_fee: MoneyResponse,
    pub total: MoneyResponse,
    pub available: bool,
}

impl QuoteResponse {
    pub fn new(property_id: Uuid, price: &StayPrice, available: bool) -> Self {
        let currency = price.currency.as_str();
        Self {
            property_id,
            nights: price.nights,
            nightly_rate: MoneyResponse::new(price.nightly_rate, currency),
            subtotal: MoneyResponse::new(price.subtotal, currency),
            service_fee: MoneyResponse::new(price.service_fee, currency),
            pet_fee: MoneyResponse::new(price.pet_fee, currency),
            total: MoneyResponse::new(price.total, currency),
            available,
        }
    }
}
