//! Stay pricing for vacation rentals.
//!
//! Turns a nightly rate and a date range into the nights / subtotal / fees /
//! total breakdown shown during checkout and stored on every booking.

pub mod calculators;
pub mod requests;
pub mod responses;
pub mod routes;

// Re-export commonly used items
pub use calculators::{
    count_nights, price_stay, round_currency, to_minor_units, PricingPolicy, StayPrice,
    StayRequest,
};
pub use routes::router;
