//! Storage seam for properties, bookings, profiles and engagement data.
//!
//! Services only see `Arc<dyn Store>`. `crate::db::PgStore` is the production
//! backend; [`MemoryStore`] backs tests and local development.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Activity, ActivityEntry, Booking, BookingFilter, BookingStats, Favorite, NewBooking,
    NewProperty, NewsletterSubscription, PaymentProvider, ProfileUpdate, Property,
    PropertyFilter, PropertyUpdate, StatusChange, UserProfile,
};

pub use memory::MemoryStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Active properties matching `filter`, cheapest first
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>>;

    async fn get_property(&self, id: Uuid) -> Result<Option<Property>>;

    async fn create_property(&self, new: NewProperty) -> Result<Property>;

    async fn update_property(&self, id: Uuid, update: PropertyUpdate) -> Result<Option<Property>>;

    /// Non-cancelled bookings of `property_id` overlapping `[check_in, check_out)`
    async fn find_overlapping_bookings(
        &self,
        property_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<Booking>>;

    /// Insert a booking if, and only if, its dates are still free.
    ///
    /// The overlap check and the insert are one atomic step; a conflicting
    /// booking yields `BookingError::Unavailable`.
    async fn create_booking(&self, new: NewBooking) -> Result<Booking>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Bookings of one user, newest first
    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>>;

    /// All bookings matching `filter`, newest first
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>>;

    /// Compare-and-swap status update. Returns `None` when the booking does not
    /// exist or its status is no longer `change.expected`.
    async fn update_booking_status(&self, id: Uuid, change: StatusChange) -> Result<Option<Booking>>;

    /// Record a new gateway order/transaction for a pending booking. Earlier
    /// attempts stay resolvable through [`Store::find_booking_by_payment_reference`].
    async fn set_payment_reference(
        &self,
        id: Uuid,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Booking>>;

    /// Booking owning any payment attempt with this provider and reference
    async fn find_booking_by_payment_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Booking>>;

    /// Cancel pending, unpaid bookings not touched since `idle_since`.
    /// Starting a checkout counts as a touch.
    async fn expire_pending_bookings(&self, idle_since: DateTime<Utc>) -> Result<Vec<Uuid>>;

    async fn booking_stats(&self) -> Result<BookingStats>;

    async fn find_profile_by_phone(&self, phone: &str) -> Result<Option<UserProfile>>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>>;

    /// Create the profile for `phone`, or return the existing one
    async fn create_profile(&self, phone: &str) -> Result<UserProfile>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<UserProfile>>;

    /// Idempotent: favouriting twice keeps the original row
    async fn add_favorite(&self, user_id: Uuid, property_id: Uuid) -> Result<Favorite>;

    /// Returns whether a favourite was removed
    async fn remove_favorite(&self, user_id: Uuid, property_id: Uuid) -> Result<bool>;

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Property>>;

    /// Idempotent on email
    async fn subscribe_newsletter(
        &self,
        email: &str,
        user_id: Option<Uuid>,
    ) -> Result<NewsletterSubscription>;

    async fn log_activity(
        &self,
        user_id: Uuid,
        action: Activity,
        detail: Option<serde_json::Value>,
    ) -> Result<()>;

    /// Most recent activity first
    async fn list_activity(&self, user_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>>;
}
