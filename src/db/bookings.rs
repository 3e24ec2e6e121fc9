//! Booking queries

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::booking::{BookedRange, BookingError};
use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingFilter, BookingStats, NewBooking, PaymentProvider, StatusChange,
};

/// SQLSTATE raised by the `bookings_no_overlap` exclusion constraint
const EXCLUSION_VIOLATION: &str = "23P01";

macro_rules! booking_columns {
    () => {
        r#"
            id, property_id, user_id, check_in, check_out, guests, pets, nights,
            subtotal, service_fee, pet_fee, total_amount, currency,
            status, payment_status, payment_provider, payment_reference,
            guest_details, created_at, updated_at
        "#
    };
}

async fn overlapping(
    conn: &mut PgConnection,
    property_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        r#"
        FROM bookings
        WHERE property_id = $1
          AND status <> 'cancelled'
          AND check_in < $3
          AND check_out > $2
        ORDER BY check_in
        "#
    ))
    .bind(property_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_all(conn)
    .await?;

    Ok(bookings)
}

pub async fn find_overlapping_bookings(
    pool: &PgPool,
    property_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Vec<Booking>> {
    let mut conn = pool.acquire().await?;
    overlapping(&mut *conn, property_id, check_in, check_out).await
}

/// Check-and-insert under a row lock on the property.
///
/// Concurrent requests for the same property queue on `FOR UPDATE`; the
/// exclusion constraint backs this up for writers that bypass the lock.
pub async fn create_booking(pool: &PgPool, new: NewBooking) -> Result<Booking> {
    let nights = i32::try_from(new.price.nights)
        .map_err(|_| AppError::BadRequest("Stay is too long".to_string()))?;

    let mut tx = pool.begin().await?;

    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM properties WHERE id = $1 FOR UPDATE")
            .bind(new.property_id)
            .fetch_optional(&mut *tx)
            .await?;
    if locked.is_none() {
        return Err(AppError::NotFound);
    }

    let conflicts = overlapping(&mut *tx, new.property_id, new.check_in, new.check_out).await?;
    if !conflicts.is_empty() {
        return Err(BookingError::Unavailable {
            conflicts: conflicts.iter().map(BookedRange::from).collect(),
        }
        .into());
    }

    let booking = sqlx::query_as::<_, Booking>(concat!(
        r#"
        INSERT INTO bookings (
            id, property_id, user_id, check_in, check_out, guests, pets, nights,
            subtotal, service_fee, pet_fee, total_amount, currency, guest_details
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING
        "#,
        booking_columns!()
    ))
    .bind(Uuid::new_v4())
    .bind(new.property_id)
    .bind(new.user_id)
    .bind(new.check_in)
    .bind(new.check_out)
    .bind(new.guests)
    .bind(new.pets)
    .bind(nights)
    .bind(new.price.subtotal)
    .bind(new.price.service_fee)
    .bind(new.price.pet_fee)
    .bind(new.price.total)
    .bind(&new.price.currency)
    .bind(Json(&new.guest_details))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION) => {
            AppError::from(BookingError::Unavailable {
                conflicts: Vec::new(),
            })
        }
        other => AppError::from(other),
    })?;

    tx.commit().await?;
    Ok(booking)
}

pub async fn get_booking(pool: &PgPool, id: Uuid) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        "FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

pub async fn list_user_bookings(pool: &PgPool, user_id: Uuid) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        r#"
        FROM bookings
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn list_bookings(pool: &PgPool, filter: &BookingFilter) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        r#"
        FROM bookings
        WHERE ($1::booking_status IS NULL OR status = $1)
          AND ($2::uuid IS NULL OR property_id = $2)
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(filter.status)
    .bind(filter.property_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// Compare-and-swap on `status`; `None` when the row moved on or is missing
pub async fn update_booking_status(
    pool: &PgPool,
    id: Uuid,
    change: StatusChange,
) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(concat!(
        r#"
        UPDATE bookings
        SET status = $3,
            payment_status = COALESCE($4, payment_status),
            updated_at = now()
        WHERE id = $1 AND status = $2
        RETURNING
        "#,
        booking_columns!()
    ))
    .bind(id)
    .bind(change.expected)
    .bind(change.status)
    .bind(change.payment_status)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

pub async fn set_payment_reference(
    pool: &PgPool,
    id: Uuid,
    provider: PaymentProvider,
    reference: &str,
) -> Result<Option<Booking>> {
    let mut tx = pool.begin().await?;

    let booking = sqlx::query_as::<_, Booking>(concat!(
        r#"
        UPDATE bookings
        SET payment_provider = $2,
            payment_reference = $3,
            payment_status = 'pending',
            updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING
        "#,
        booking_columns!()
    ))
    .bind(id)
    .bind(provider)
    .bind(reference)
    .fetch_optional(&mut *tx)
    .await?;

    if booking.is_some() {
        sqlx::query(
            r#"
            INSERT INTO payment_attempts (provider, reference, booking_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, reference) DO NOTHING
            "#,
        )
        .bind(provider)
        .bind(reference)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(booking)
}

pub async fn find_booking_by_payment_reference(
    pool: &PgPool,
    provider: PaymentProvider,
    reference: &str,
) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(concat!(
        "SELECT ",
        booking_columns!(),
        r#"
        FROM bookings
        WHERE id = (
            SELECT booking_id FROM payment_attempts
            WHERE provider = $1 AND reference = $2
        )
        "#
    ))
    .bind(provider)
    .bind(reference)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

pub async fn expire_pending_bookings(
    pool: &PgPool,
    idle_since: DateTime<Utc>,
) -> Result<Vec<Uuid>> {
    let expired: Vec<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE bookings
        SET status = 'cancelled', updated_at = now()
        WHERE status = 'pending'
          AND payment_status <> 'paid'
          AND updated_at < $1
        RETURNING id
        "#,
    )
    .bind(idle_since)
    .fetch_all(pool)
    .await?;

    Ok(expired)
}

pub async fn booking_stats(pool: &PgPool) -> Result<BookingStats> {
    let stats = sqlx::query_as::<_, BookingStats>(
        r#"
        SELECT
            COUNT(*) AS total_bookings,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
            COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
            COUNT(*) FILTER (WHERE status = 'completed') AS completed,
            COALESCE(
                SUM(total_amount) FILTER (WHERE status IN ('confirmed', 'completed')),
                0
            ) AS confirmed_revenue,
            (SELECT COUNT(*) FROM properties WHERE is_active) AS active_properties
        FROM bookings
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
