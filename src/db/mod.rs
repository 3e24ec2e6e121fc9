//! Postgres backend for the [`Store`] trait

mod bookings;
mod engagement;
mod properties;
mod users;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Activity, ActivityEntry, Booking, BookingFilter, BookingStats, Favorite, NewBooking,
    NewProperty, NewsletterSubscription, PaymentProvider, ProfileUpdate, Property,
    PropertyFilter, PropertyUpdate, StatusChange, UserProfile,
};
use crate::store::Store;

/// Open a pool and bring the schema up to date
pub async fn connect(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        properties::list_properties(&self.pool, filter).await
    }

    async fn get_property(&self, id: Uuid) -> Result<Option<Property>> {
        properties::get_property(&self.pool, id).await
    }

    async fn create_property(&self, new: NewProperty) -> Result<Property> {
        properties::create_property(&self.pool, new).await
    }

    async fn update_property(&self, id: Uuid, update: PropertyUpdate) -> Result<Option<Property>> {
        properties::update_property(&self.pool, id, update).await
    }

    async fn find_overlapping_bookings(
        &self,
        property_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<Booking>> {
        bookings::find_overlapping_bookings(&self.pool, property_id, check_in, check_out).await
    }

    async fn create_booking(&self, new: NewBooking) -> Result<Booking> {
        bookings::create_booking(&self.pool, new).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        bookings::get_booking(&self.pool, id).await
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        bookings::list_user_bookings(&self.pool, user_id).await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        bookings::list_bookings(&self.pool, filter).await
    }

    async fn update_booking_status(&self, id: Uuid, change: StatusChange) -> Result<Option<Booking>> {
        bookings::update_booking_status(&self.pool, id, change).await
    }

    async fn set_payment_reference(
        &self,
        id: Uuid,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Booking>> {
        bookings::set_payment_reference(&self.pool, id, provider, reference).await
    }

    async fn find_booking_by_payment_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Booking>> {
        bookings::find_booking_by_payment_reference(&self.pool, provider, reference).await
    }

    async fn expire_pending_bookings(&self, idle_since: DateTime<Utc>) -> Result<Vec<Uuid>> {
        bookings::expire_pending_bookings(&self.pool, idle_since).await
    }

    async fn booking_stats(&self) -> Result<BookingStats> {
        bookings::booking_stats(&self.pool).await
    }

    async fn find_profile_by_phone(&self, phone: &str) -> Result<Option<UserProfile>> {
        users::find_profile_by_phone(&self.pool, phone).await
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        users::get_profile(&self.pool, id).await
    }

    async fn create_profile(&self, phone: &str) -> Result<UserProfile> {
        users::create_profile(&self.pool, phone).await
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<UserProfile>> {
        users::update_profile(&self.pool, id, update).await
    }

    async fn add_favorite(&self, user_id: Uuid, property_id: Uuid) -> Result<Favorite> {
        engagement::add_favorite(&self.pool, user_id, property_id).await
    }

    async fn remove_favorite(&self, user_id: Uuid, property_id: Uuid) -> Result<bool> {
        engagement::remove_favorite(&self.pool, user_id, property_id).await
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Property>> {
        engagement::list_favorites(&self.pool, user_id).await
    }

    async fn subscribe_newsletter(
        &self,
        email: &str,
        user_id: Option<Uuid>,
    ) -> Result<NewsletterSubscription> {
        engagement::subscribe_newsletter(&self.pool, email, user_id).await
    }

    async fn log_activity(
        &self,
        user_id: Uuid,
        action: Activity,
        detail: Option<serde_json::Value>,
    ) -> Result<()> {
        engagement::log_activity(&self.pool, user_id, action, detail).await
    }

    async fn list_activity(&self, user_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>> {
        engagement::list_activity(&self.pool, user_id, limit).await
    }
}
