//! Booking service functions with store access.
//!
//! Handlers stay thin; everything that decides whether a booking may be
//! created or moved lives here.

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{
    Activity, Booking, BookingStatus, GuestDetails, NewBooking, PaymentProvider, PaymentStatus,
    Property, StatusChange,
};
use crate::notify::{BookingConfirmation, Notifier};
use crate::pricing::{count_nights, price_stay, PricingPolicy, StayPrice, StayRequest};
use crate::store::Store;

use super::requests::CreateBookingRequest;
use super::responses::AvailabilityResponse;
use super::{BookedRange, BookingError, Transition, MAX_NIGHTS};

/// Check a stay request against the property's rules
pub fn validate_stay(
    property: &Property,
    stay: &StayRequest,
    today: NaiveDate,
) -> std::result::Result<(), BookingError> {
    if !property.is_active {
        return Err(BookingError::PropertyInactive);
    }
    if stay.check_out <= stay.check_in {
        return Err(BookingError::InvalidDateRange);
    }
    if stay.check_in < today {
        return Err(BookingError::CheckInInPast);
    }
    if count_nights(stay.check_in, stay.check_out) > MAX_NIGHTS {
        return Err(BookingError::StayTooLong { max: MAX_NIGHTS });
    }
    if stay.guests == 0 {
        return Err(BookingError::NoGuests);
    }
    if i64::from(stay.guests) > i64::from(property.max_guests) {
        return Err(BookingError::TooManyGuests {
            max: property.max_guests,
        });
    }
    if stay.pets > 0 && !property.pets_allowed {
        return Err(BookingError::PetsNotAllowed);
    }
    Ok(())
}

async fn load_property(store: &dyn Store, property_id: Uuid) -> Result<Property> {
    store.get_property(property_id).await?.ok_or(AppError::NotFound)
}

/// Advisory availability check; creation re-checks atomically
pub async fn check_availability(
    store: &dyn Store,
    property_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<AvailabilityResponse> {
    if check_out <= check_in {
        return Err(BookingError::InvalidDateRange.into());
    }
    load_property(store, property_id).await?;

    let conflicts = store
        .find_overlapping_bookings(property_id, check_in, check_out)
        .await?;

    Ok(AvailabilityResponse {
        property_id,
        check_in,
        check_out,
        available: conflicts.is_empty(),
        conflicts: conflicts.iter().map(BookedRange::from).collect(),
    })
}

/// Price a stay at a property after validating it
pub async fn quote_stay(
    store: &dyn Store,
    policy: &PricingPolicy,
    property_id: Uuid,
    stay: &StayRequest,
    today: NaiveDate,
) -> Result<StayPrice> {
    let property = load_property(store, property_id).await?;
    validate_stay(&property, stay, today)?;
    Ok(price_stay(policy, property.price_per_night, stay))
}

/// Create a pending booking for `user`
pub async fn create_booking(
    store: &dyn Store,
    policy: &PricingPolicy,
    user: &AuthUser,
    request: CreateBookingRequest,
    today: NaiveDate,
) -> Result<Booking> {
    let property = load_property(store, request.property_id).await?;
    let stay = request.stay();
    validate_stay(&property, &stay, today)?;

    let price = price_stay(policy, property.price_per_night, &stay);

    let mut guest_details = request.guest_details.unwrap_or_else(|| GuestDetails {
        name: user.profile.full_name.clone().unwrap_or_default(),
        email: user.profile.email.clone(),
        ..Default::default()
    });
    if guest_details.name.trim().is_empty() {
        return Err(AppError::BadRequest("Guest name is required".to_string()));
    }
    if guest_details.phone.is_none() {
        guest_details.phone = Some(user.profile.phone.clone());
    }

    let booking = store
        .create_booking(NewBooking {
            property_id: property.id,
            user_id: user.profile.id,
            check_in: stay.check_in,
            check_out: stay.check_out,
            guests: i32::try_from(stay.guests).map_err(|_| BookingError::TooManyGuests {
                max: property.max_guests,
            })?,
            pets: i32::try_from(stay.pets)
                .map_err(|_| AppError::BadRequest("Too many pets".to_string()))?,
            price,
            guest_details,
        })
        .await?;

    tracing::info!(
        booking_id = %booking.id,
        property_id = %property.id,
        total = %booking.total_amount,
        "Booking created"
    );
    log_best_effort(
        store,
        user.profile.id,
        Activity::BookingCreated,
        json!({ "booking_id": booking.id, "property_id": property.id }),
    )
    .await;

    Ok(booking)
}

/// Fetch a booking, enforcing that only its owner or an admin can see it
pub async fn get_booking_for(store: &dyn Store, id: Uuid, user: &AuthUser) -> Result<Booking> {
    let booking = store.get_booking(id).await?.ok_or(AppError::NotFound)?;
    if booking.user_id != user.profile.id && !user.is_admin {
        return Err(BookingError::NotOwner.into());
    }
    Ok(booking)
}

/// Move `booking` to `target`, guarded by the status machine and a
/// compare-and-swap on the status it was read with
pub async fn apply_status(
    store: &dyn Store,
    booking: Booking,
    target: BookingStatus,
    payment_status: Option<PaymentStatus>,
) -> Result<Booking> {
    match booking.status.transition_to(target)? {
        Transition::Unchanged => Ok(booking),
        Transition::Apply => store
            .update_booking_status(
                booking.id,
                StatusChange {
                    expected: booking.status,
                    status: target,
                    payment_status,
                },
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Booking was modified concurrently, please retry".to_string())
            }),
    }
}

/// Cancel a booking. Cancelling an already-cancelled booking returns it unchanged.
pub async fn cancel_booking(store: &dyn Store, id: Uuid, user: &AuthUser) -> Result<Booking> {
    let booking = get_booking_for(store, id, user).await?;
    let was_cancelled = booking.status == BookingStatus::Cancelled;
    let booking = apply_status(store, booking, BookingStatus::Cancelled, None).await?;

    if !was_cancelled {
        tracing::info!(booking_id = %booking.id, "Booking cancelled");
        log_best_effort(
            store,
            booking.user_id,
            Activity::BookingCancelled,
            json!({ "booking_id": booking.id }),
        )
        .await;
    }
    Ok(booking)
}

/// Confirm a booking after its payment has been verified with the gateway
pub async fn confirm_payment(
    store: &dyn Store,
    notifier: &dyn Notifier,
    booking_id: Uuid,
    provider: PaymentProvider,
    reference: &str,
) -> Result<Booking> {
    let booking = payment_attempt_booking(store, booking_id, provider, reference).await?;

    if booking.status == BookingStatus::Cancelled {
        tracing::warn!(
            booking_id = %booking.id,
            %provider,
            reference,
            "Payment received for a cancelled booking; refund required"
        );
    }

    let was_confirmed = booking.status == BookingStatus::Confirmed;
    let booking = apply_status(
        store,
        booking,
        BookingStatus::Confirmed,
        Some(PaymentStatus::Paid),
    )
    .await?;

    if !was_confirmed {
        tracing::info!(booking_id = %booking.id, %provider, reference, "Booking confirmed");
        log_best_effort(
            store,
            booking.user_id,
            Activity::BookingConfirmed,
            json!({ "booking_id": booking.id, "provider": provider.to_string() }),
        )
        .await;
        send_confirmation(store, notifier, &booking).await;
    }
    Ok(booking)
}

/// Mark a pending booking's payment as failed; the booking stays pending
pub async fn record_payment_failure(
    store: &dyn Store,
    booking_id: Uuid,
    provider: PaymentProvider,
    reference: &str,
) -> Result<Booking> {
    let booking = payment_attempt_booking(store, booking_id, provider, reference).await?;

    if booking.status != BookingStatus::Pending {
        return Ok(booking);
    }

    tracing::warn!(booking_id = %booking.id, %provider, "Payment failed");
    store
        .update_booking_status(
            booking.id,
            StatusChange {
                expected: BookingStatus::Pending,
                status: BookingStatus::Pending,
                payment_status: Some(PaymentStatus::Failed),
            },
        )
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Booking was modified concurrently, please retry".to_string())
        })
}

/// The booking behind one of its payment attempts, older retries included
async fn payment_attempt_booking(
    store: &dyn Store,
    booking_id: Uuid,
    provider: PaymentProvider,
    reference: &str,
) -> Result<Booking> {
    match store
        .find_booking_by_payment_reference(provider, reference)
        .await?
    {
        Some(booking) if booking.id == booking_id => Ok(booking),
        _ => Err(AppError::BadRequest(
            "Payment does not belong to this booking".to_string(),
        )),
    }
}

async fn send_confirmation(store: &dyn Store, notifier: &dyn Notifier, booking: &Booking) {
    let phone = match &booking.guest_details.phone {
        Some(phone) => phone.clone(),
        None => match store.get_profile(booking.user_id).await {
            Ok(Some(profile)) => profile.phone,
            _ => return,
        },
    };
    let property_name = match store.get_property(booking.property_id).await {
        Ok(Some(property)) => property.name,
        _ => String::new(),
    };

    let confirmation = BookingConfirmation {
        booking_id: booking.id,
        guest_name: booking.guest_details.name.clone(),
        property_name,
        check_in: booking.check_in,
        check_out: booking.check_out,
        total: booking.total_amount,
        currency: booking.currency.clone(),
    };
    if let Err(e) = notifier
        .send_booking_confirmation(&phone, &confirmation)
        .await
    {
        tracing::warn!(booking_id = %booking.id, "Failed to send booking confirmation: {}", e);
    }
}

/// Activity logging never fails the request it belongs to
pub async fn log_best_effort(
    store: &dyn Store,
    user_id: Uuid,
    activity: Activity,
    detail: serde_json::Value,
) {
    if let Err(e) = store.log_activity(user_id, activity, Some(detail)).await {
        tracing::warn!("Failed to record {} activity: {}", activity.as_str(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn property() -> Property {
        Property {
            id: Uuid::new_v4(),
            name: "Cliff House".to_string(),
            location: "Varkala".to_string(),
            description: String::new(),
            category: "cliff".to_string(),
            aesthetic_tags: vec![],
            max_guests: 4,
            bedrooms: 2,
            bathrooms: 2,
            price_per_night: dec!(6200),
            image_urls: vec![],
            features: vec![],
            testimonials: vec![],
            pets_allowed: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stay(check_in: NaiveDate, check_out: NaiveDate, guests: u32, pets: u32) -> StayRequest {
        StayRequest {
            check_in,
            check_out,
            guests,
            pets,
        }
    }

    #[test]
    fn test_validate_stay_accepts_valid_request() {
        let today = date(2, 1);
        assert!(validate_stay(&property(), &stay(date(2, 15), date(2, 18), 4, 0), today).is_ok());
        // Same-day check-in is allowed
        assert!(validate_stay(&property(), &stay(today, date(2, 2), 1, 0), today).is_ok());
    }

    #[test]
    fn test_validate_stay_rejections() {
        let today = date(2, 1);
        let p = property();

        assert!(matches!(
            validate_stay(&p, &stay(date(2, 18), date(2, 15), 2, 0), today),
            Err(BookingError::InvalidDateRange)
        ));
        assert!(matches!(
            validate_stay(&p, &stay(date(2, 15), date(2, 15), 2, 0), today),
            Err(BookingError::InvalidDateRange)
        ));
        assert!(matches!(
            validate_stay(&p, &stay(date(1, 20), date(1, 22), 2, 0), today),
            Err(BookingError::CheckInInPast)
        ));
        assert!(matches!(
            validate_stay(&p, &stay(date(2, 15), date(2, 18), 0, 0), today),
            Err(BookingError::NoGuests)
        ));
        assert!(matches!(
            validate_stay(&p, &stay(date(2, 15), date(2, 18), 5, 0), today),
            Err(BookingError::TooManyGuests { max: 4 })
        ));
        assert!(matches!(
            validate_stay(&p, &stay(date(2, 15), date(2, 18), 2, 1), today),
            Err(BookingError::PetsNotAllowed)
        ));
        assert!(matches!(
            validate_stay(&p, &stay(date(2, 15), date(7, 1), 2, 0), today),
            Err(BookingError::StayTooLong { max: MAX_NIGHTS })
        ));

        let mut inactive = property();
        inactive.is_active = false;
        assert!(matches!(
            validate_stay(&inactive, &stay(date(2, 15), date(2, 18), 2, 0), today),
            Err(BookingError::PropertyInactive)
        ));
    }
}
