//! Request DTOs for booking endpoints.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{BookingStatus, GuestDetails, PaymentProvider};
use crate::pricing::StayRequest;

/// Request to book a property
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    #[serde(default)]
    pub pets: u32,
    #[serde(default)]
    pub guest_details: Option<GuestDetails>,
}

impl CreateBookingRequest {
    pub fn stay(&self) -> StayRequest {
        StayRequest {
            check_in: self.check_in,
            check_out: self.check_out,
            guests: self.guests,
            pets: self.pets,
        }
    }
}

/// Query string for the availability check
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Request to start paying for a booking
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub provider: PaymentProvider,
}

/// Admin status override
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: BookingStatus,
}
