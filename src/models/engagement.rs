//! Favourites, newsletter and activity log models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub property_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NewsletterSubscription {
    pub id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Actions recorded in the activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    OtpVerified,
    ProfileUpdated,
    BookingCreated,
    BookingCancelled,
    BookingConfirmed,
    FavoriteAdded,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::OtpVerified => "otp_verified",
            Activity::ProfileUpdated => "profile_updated",
            Activity::BookingCreated => "booking_created",
            Activity::BookingCancelled => "booking_cancelled",
            Activity::BookingConfirmed => "booking_confirmed",
            Activity::FavoriteAdded => "favorite_added",
        }
    }
}
