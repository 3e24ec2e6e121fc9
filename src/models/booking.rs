//! Booking models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::pricing::StayPrice;

/// Lifecycle state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Razorpay,
    PhonePe,
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentProvider::Razorpay => f.write_str("razorpay"),
            PaymentProvider::PhonePe => f.write_str("phonepe"),
        }
    }
}

/// Contact details of the lead guest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// Booking from the `bookings` table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub pets: i32,
    pub nights: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub service_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub pet_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub currency: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_provider: Option<PaymentProvider>,
    pub payment_reference: Option<String>,
    #[sqlx(json)]
    pub guest_details: GuestDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Half-open `[check_in, check_out)` overlap test
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && self.check_out > check_in
    }

    /// Whether this booking still holds its dates
    pub fn blocks_dates(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Everything needed to insert a booking; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub pets: i32,
    pub price: StayPrice,
    pub guest_details: GuestDetails,
}

/// Status change applied with a compare-and-swap on the current status
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub expected: BookingStatus,
    pub status: BookingStatus,
    pub payment_status: Option<PaymentStatus>,
}

/// Admin booking listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub property_id: Option<Uuid>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.status == s)
            && self.property_id.map_or(true, |p| booking.property_id == p)
    }
}

/// Aggregate numbers for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub completed: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub confirmed_revenue: Decimal,
    pub active_properties: i64,
}
