//! Response DTOs for booking endpoints.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::BookedRange;

/// Response for the availability check
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub available: bool,
    pub conflicts: Vec<BookedRange>,
}
