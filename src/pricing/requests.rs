//! Request DTOs for pricing API endpoints.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::StayRequest;

/// Request to price a stay at a property
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub pets: u32,
}

fn default_guests() -> u32 {
    1
}

impl QuoteRequest {
    pub fn stay(&self) -> StayRequest {
        StayRequest {
            check_in: self.check_in,
            check_out: self.check_out,
            guests: self.guests,
            pets: self.pets,
        }
    }
}
