//! Booking flow: availability, creation, lifecycle transitions and expiry.

pub mod expiry;
pub mod lifecycle;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Booking, BookingStatus};

pub use lifecycle::Transition;
pub use routes::router;

/// Longest stay accepted in one booking
pub const MAX_NIGHTS: i64 = 90;

/// Date range held by another booking; exposed instead of the booking itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl From<&Booking> for BookedRange {
    fn from(booking: &Booking) -> Self {
        Self {
            check_in: booking.check_in,
            check_out: booking.check_out,
        }
    }
}

/// Booking validation and lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Check-out must be after check-in")]
    InvalidDateRange,

    #[error("Check-in date is in the past")]
    CheckInInPast,

    #[error("Stays are limited to {max} nights")]
    StayTooLong { max: i64 },

    #[error("At least one guest is required")]
    NoGuests,

    #[error("This property hosts at most {max} guests")]
    TooManyGuests { max: i32 },

    #[error("This property does not allow pets")]
    PetsNotAllowed,

    #[error("This property is not accepting bookings")]
    PropertyInactive,

    #[error("Selected dates are not available")]
    Unavailable { conflicts: Vec<BookedRange> },

    #[error("Cannot move a {from} booking to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking belongs to another user")]
    NotOwner,
}
