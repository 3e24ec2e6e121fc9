//! In-process store used by tests and `STORE_BACKEND=memory`

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::booking::{BookedRange, BookingError};
use crate::error::{AppError, Result};
use crate::models::{
    Activity, ActivityEntry, Booking, BookingFilter, BookingStats, BookingStatus, Favorite,
    NewBooking, NewProperty, NewsletterSubscription, PaymentProvider, PaymentStatus,
    ProfileUpdate, Property, PropertyFilter, PropertyUpdate, StatusChange, UserProfile,
};

use super::Store;

#[derive(Default)]
struct Tables {
    properties: HashMap<Uuid, Property>,
    bookings: HashMap<Uuid, Booking>,
    profiles: HashMap<Uuid, UserProfile>,
    favorites: Vec<Favorite>,
    newsletter: HashMap<String, NewsletterSubscription>,
    activity: Vec<ActivityEntry>,
    payment_attempts: HashMap<(PaymentProvider, String), Uuid>,
}

impl Tables {
    fn overlapping(&self, property_id: Uuid, check_in: NaiveDate, check_out: NaiveDate) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .bookings
            .values()
            .filter(|b| {
                b.property_id == property_id && b.blocks_dates() && b.overlaps(check_in, check_out)
            })
            .cloned()
            .collect();
        found.sort_by_key(|b| b.check_in);
        found
    }
}

/// Store keeping every table in memory behind a single lock
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    bookings
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_properties(&self, filter: &PropertyFilter) -> Result<Vec<Property>> {
        let tables = self.tables.read().await;
        let mut properties: Vec<Property> = tables
            .properties
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        properties.sort_by(|a, b| {
            a.price_per_night
                .cmp(&b.price_per_night)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(properties)
    }

    async fn get_property(&self, id: Uuid) -> Result<Option<Property>> {
        Ok(self.tables.read().await.properties.get(&id).cloned())
    }

    async fn create_property(&self, new: NewProperty) -> Result<Property> {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            name: new.name,
            location: new.location,
            description: new.description,
            category: new.category,
            aesthetic_tags: new.aesthetic_tags,
            max_guests: new.max_guests,
            bedrooms: new.bedrooms,
            bathrooms: new.bathrooms,
            price_per_night: new.price_per_night,
            image_urls: new.image_urls,
            features: new.features,
            testimonials: new.testimonials,
            pets_allowed: new.pets_allowed,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .properties
            .insert(property.id, property.clone());
        Ok(property)
    }

    async fn update_property(&self, id: Uuid, update: PropertyUpdate) -> Result<Option<Property>> {
        let mut tables = self.tables.write().await;
        let Some(property) = tables.properties.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(property);
        property.updated_at = Utc::now();
        Ok(Some(property.clone()))
    }

    async fn find_overlapping_bookings(
        &self,
        property_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .tables
            .read()
            .await
            .overlapping(property_id, check_in, check_out))
    }

    async fn create_booking(&self, new: NewBooking) -> Result<Booking> {
        // Write lock spans the check and the insert
        let mut tables = self.tables.write().await;

        if !tables.properties.contains_key(&new.property_id) {
            return Err(AppError::NotFound);
        }

        let conflicts = tables.overlapping(new.property_id, new.check_in, new.check_out);
        if !conflicts.is_empty() {
            return Err(BookingError::Unavailable {
                conflicts: conflicts.iter().map(BookedRange::from).collect(),
            }
            .into());
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            property_id: new.property_id,
            user_id: new.user_id,
            check_in: new.check_in,
            check_out: new.check_out,
            guests: new.guests,
            pets: new.pets,
            nights: i32::try_from(new.price.nights)
                .map_err(|_| AppError::BadRequest("Stay is too long".to_string()))?,
            subtotal: new.price.subtotal,
            service_fee: new.price.service_fee,
            pet_fee: new.price.pet_fee,
            total_amount: new.price.total,
            currency: new.price.currency,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_provider: None,
            payment_reference: None,
            guest_details: new.guest_details,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .bookings
                .values()
                .filter(|b| filter.matches(b))
                .cloned()
                .collect(),
        ))
    }

    async fn update_booking_status(&self, id: Uuid, change: StatusChange) -> Result<Option<Booking>> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.get_mut(&id) else {
            return Ok(None);
        };
        if booking.status != change.expected {
            return Ok(None);
        }
        booking.status = change.status;
        if let Some(payment_status) = change.payment_status {
            booking.payment_status = payment_status;
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn set_payment_reference(
        &self,
        id: Uuid,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Booking>> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.get_mut(&id) else {
            return Ok(None);
        };
        if booking.status != BookingStatus::Pending {
            return Ok(None);
        }
        booking.payment_provider = Some(provider);
        booking.payment_reference = Some(reference.to_string());
        booking.payment_status = PaymentStatus::Pending;
        booking.updated_at = Utc::now();
        let booking = booking.clone();
        tables
            .payment_attempts
            .entry((provider, reference.to_string()))
            .or_insert(id);
        Ok(Some(booking))
    }

    async fn find_booking_by_payment_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payment_attempts
            .get(&(provider, reference.to_string()))
            .and_then(|id| tables.bookings.get(id))
            .cloned())
    }

    async fn expire_pending_bookings(&self, idle_since: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut expired = Vec::new();
        for booking in tables.bookings.values_mut() {
            if booking.status == BookingStatus::Pending
                && booking.payment_status != PaymentStatus::Paid
                && booking.updated_at < idle_since
            {
                booking.status = BookingStatus::Cancelled;
                booking.updated_at = now;
                expired.push(booking.id);
            }
        }
        Ok(expired)
    }

    async fn booking_stats(&self) -> Result<BookingStats> {
        let tables = self.tables.read().await;
        let mut stats = BookingStats {
            active_properties: tables.properties.values().filter(|p| p.is_active).count() as i64,
            ..Default::default()
        };
        for booking in tables.bookings.values() {
            stats.total_bookings += 1;
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
                BookingStatus::Completed => stats.completed += 1,
            }
            if matches!(
                booking.status,
                BookingStatus::Confirmed | BookingStatus::Completed
            ) {
                stats.confirmed_revenue += booking.total_amount;
            }
        }
        Ok(stats)
    }

    async fn find_profile_by_phone(&self, phone: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .tables
            .read()
            .await
            .profiles
            .values()
            .find(|p| p.phone == phone)
            .cloned())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn create_profile(&self, phone: &str) -> Result<UserProfile> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.profiles.values().find(|p| p.phone == phone) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            phone: phone.to_string(),
            full_name: None,
            email: None,
            bio: None,
            marketing_consent: false,
            whatsapp_consent: false,
            preferences: Default::default(),
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<UserProfile>> {
        let mut tables = self.tables.write().await;
        let Some(profile) = tables.profiles.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(profile);
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn add_favorite(&self, user_id: Uuid, property_id: Uuid) -> Result<Favorite> {
        let mut tables = self.tables.write().await;
        if !tables.properties.contains_key(&property_id) {
            return Err(AppError::NotFound);
        }
        if let Some(existing) = tables
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.property_id == property_id)
        {
            return Ok(existing.clone());
        }
        let favorite = Favorite {
            user_id,
            property_id,
            created_at: Utc::now(),
        };
        tables.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn remove_favorite(&self, user_id: Uuid, property_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == user_id && f.property_id == property_id));
        Ok(tables.favorites.len() != before)
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Property>> {
        let tables = self.tables.read().await;
        let mut favorites: Vec<&Favorite> =
            tables.favorites.iter().filter(|f| f.user_id == user_id).collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites
            .into_iter()
            .filter_map(|f| tables.properties.get(&f.property_id).cloned())
            .collect())
    }

    async fn subscribe_newsletter(
        &self,
        email: &str,
        user_id: Option<Uuid>,
    ) -> Result<NewsletterSubscription> {
        let mut tables = self.tables.write().await;
        let key = email.to_lowercase();
        let subscription = tables
            .newsletter
            .entry(key.clone())
            .or_insert_with(|| NewsletterSubscription {
                id: Uuid::new_v4(),
                email: key,
                user_id,
                subscribed_at: Utc::now(),
            });
        if subscription.user_id.is_none() {
            subscription.user_id = user_id;
        }
        Ok(subscription.clone())
    }

    async fn log_activity(
        &self,
        user_id: Uuid,
        action: Activity,
        detail: Option<serde_json::Value>,
    ) -> Result<()> {
        self.tables.write().await.activity.push(ActivityEntry {
            id: Uuid::new_v4(),
            user_id,
            action: action.as_str().to_string(),
            detail,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_activity(&self, user_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .activity
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GuestDetails;
    use crate::pricing::{price_stay, PricingPolicy, StayRequest};
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    async fn store_with_property() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let property = store
            .create_property(NewProperty {
                name: "Casa Azul".to_string(),
                location: "Goa".to_string(),
                description: String::new(),
                category: "beach".to_string(),
                aesthetic_tags: vec![],
                max_guests: 4,
                bedrooms: 2,
                bathrooms: 1,
                price_per_night: dec!(6200),
                image_urls: vec![],
                features: vec![],
                testimonials: vec![],
                pets_allowed: true,
            })
            .await
            .unwrap();
        (store, property.id)
    }

    fn new_booking(property_id: Uuid, check_in: NaiveDate, check_out: NaiveDate) -> NewBooking {
        let stay = StayRequest {
            check_in,
            check_out,
            guests: 2,
            pets: 0,
        };
        NewBooking {
            property_id,
            user_id: Uuid::new_v4(),
            check_in,
            check_out,
            guests: 2,
            pets: 0,
            price: price_stay(&PricingPolicy::default(), dec!(6200), &stay),
            guest_details: GuestDetails {
                name: "Guest".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_create_booking_rejects_overlap() {
        let (store, property_id) = store_with_property().await;
        store
            .create_booking(new_booking(property_id, date(2, 15), date(2, 18)))
            .await
            .unwrap();

        let err = store
            .create_booking(new_booking(property_id, date(2, 17), date(2, 20)))
            .await
            .unwrap_err();
        match err {
            AppError::Booking(BookingError::Unavailable { conflicts }) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].check_in, date(2, 15));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_back_to_back_stays_do_not_overlap() {
        let (store, property_id) = store_with_property().await;
        store
            .create_booking(new_booking(property_id, date(2, 15), date(2, 18)))
            .await
            .unwrap();
        store
            .create_booking(new_booking(property_id, date(2, 18), date(2, 20)))
            .await
            .unwrap();
        store
            .create_booking(new_booking(property_id, date(2, 10), date(2, 15)))
            .await
            .unwrap();

        let found = store
            .find_overlapping_bookings(property_id, date(2, 14), date(2, 19))
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].check_in <= w[1].check_in));
    }

    #[tokio::test]
    async fn test_cancelled_bookings_release_dates() {
        let (store, property_id) = store_with_property().await;
        let booking = store
            .create_booking(new_booking(property_id, date(3, 1), date(3, 5)))
            .await
            .unwrap();
        store
            .update_booking_status(
                booking.id,
                StatusChange {
                    expected: BookingStatus::Pending,
                    status: BookingStatus::Cancelled,
                    payment_status: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        let found = store
            .find_overlapping_bookings(property_id, date(3, 2), date(3, 3))
            .await
            .unwrap();
        assert!(found.is_empty());
        store
            .create_booking(new_booking(property_id, date(3, 2), date(3, 3)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_update_is_compare_and_swap() {
        let (store, property_id) = store_with_property().await;
        let booking = store
            .create_booking(new_booking(property_id, date(4, 1), date(4, 3)))
            .await
            .unwrap();

        let stale = StatusChange {
            expected: BookingStatus::Confirmed,
            status: BookingStatus::Completed,
            payment_status: None,
        };
        assert!(store
            .update_booking_status(booking.id, stale)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.get_booking(booking.id).await.unwrap().unwrap().status,
            BookingStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_exactly_one() {
        let (store, property_id) = store_with_property().await;
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_booking(new_booking(property_id, date(5, 1), date(5, 4)))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_expire_pending_bookings() {
        let (store, property_id) = store_with_property().await;
        let booking = store
            .create_booking(new_booking(property_id, date(6, 1), date(6, 3)))
            .await
            .unwrap();

        let expired = store
            .expire_pending_bookings(booking.created_at - chrono::Duration::minutes(1))
            .await
            .unwrap();
        assert!(expired.is_empty());

        let expired = store
            .expire_pending_bookings(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(expired, vec![booking.id]);
        assert_eq!(
            store.get_booking(booking.id).await.unwrap().unwrap().status,
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_retried_checkout_keeps_earlier_attempts() {
        let (store, property_id) = store_with_property().await;
        let booking = store
            .create_booking(new_booking(property_id, date(6, 1), date(6, 3)))
            .await
            .unwrap();

        for order in ["order_A", "order_B"] {
            store
                .set_payment_reference(booking.id, PaymentProvider::Razorpay, order)
                .await
                .unwrap()
                .unwrap();
        }

        for order in ["order_A", "order_B"] {
            let found = store
                .find_booking_by_payment_reference(PaymentProvider::Razorpay, order)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(found.id, booking.id);
            assert_eq!(found.payment_reference.as_deref(), Some("order_B"));
        }
        assert!(store
            .find_booking_by_payment_reference(PaymentProvider::PhonePe, "order_A")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_checkout_defers_expiry() {
        let (store, property_id) = store_with_property().await;
        let booking = store
            .create_booking(new_booking(property_id, date(6, 1), date(6, 3)))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let cutoff = Utc::now();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .set_payment_reference(booking.id, PaymentProvider::PhonePe, "TXN1")
            .await
            .unwrap()
            .unwrap();

        // Created before the cutoff, but checkout started after it
        let expired = store.expire_pending_bookings(cutoff).await.unwrap();
        assert!(expired.is_empty());
        assert_eq!(
            store.get_booking(booking.id).await.unwrap().unwrap().status,
            BookingStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_create_profile_is_idempotent_per_phone() {
        let store = MemoryStore::new();
        let first = store.create_profile("+919876543210").await.unwrap();
        let second = store.create_profile("+919876543210").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_favorites_and_newsletter_are_idempotent() {
        let (store, property_id) = store_with_property().await;
        let user_id = Uuid::new_v4();

        store.add_favorite(user_id, property_id).await.unwrap();
        store.add_favorite(user_id, property_id).await.unwrap();
        assert_eq!(store.list_favorites(user_id).await.unwrap().len(), 1);
        assert!(store.remove_favorite(user_id, property_id).await.unwrap());
        assert!(!store.remove_favorite(user_id, property_id).await.unwrap());

        let a = store.subscribe_newsletter("Guest@Example.com", None).await.unwrap();
        let b = store
            .subscribe_newsletter("guest@example.com", Some(user_id))
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.user_id, Some(user_id));
    }
}
