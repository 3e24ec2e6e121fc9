//! Admin route handlers: bookings, properties, stats and cache control

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::booking::requests::SetStatusRequest;
use crate::booking::services::apply_status;
use crate::cache::CacheStats;
use crate::error::{AppError, Result};
use crate::models::{
    validate_property_fields, Booking, BookingFilter, BookingStats, NewProperty, Property,
    PropertyUpdate,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/bookings", get(list_bookings))
        .route("/api/admin/bookings/:id/status", post(set_booking_status))
        .route("/api/admin/properties", post(create_property))
        .route("/api/admin/properties/:id", patch(update_property))
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/cache/invalidate", post(invalidate_cache))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.store.list_bookings(&filter).await?))
}

/// Admin confirm / complete / cancel, through the same status machine
pub async fn set_booking_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Booking>> {
    let booking = state.store.get_booking(id).await?.ok_or(AppError::NotFound)?;
    let from = booking.status;
    let booking = apply_status(state.store.as_ref(), booking, request.status, None).await?;

    tracing::info!(
        booking_id = %id,
        admin_id = %admin.profile.id,
        %from,
        to = %booking.status,
        "Booking status set by admin"
    );
    Ok(Json(booking))
}

pub async fn create_property(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(new): Json<NewProperty>,
) -> Result<(StatusCode, Json<Property>)> {
    validate_property_fields(new.max_guests, new.price_per_night, &new.testimonials)
        .map_err(AppError::BadRequest)?;
    if new.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let property = state.store.create_property(new).await?;
    state.cache.listings.invalidate_all();
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn update_property(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(update): Json<PropertyUpdate>,
) -> Result<Json<Property>> {
    let current = state.store.get_property(id).await?.ok_or(AppError::NotFound)?;

    let mut preview = current;
    update.clone().apply(&mut preview);
    validate_property_fields(preview.max_guests, preview.price_per_night, &preview.testimonials)
        .map_err(AppError::BadRequest)?;

    let property = state
        .store
        .update_property(id, update)
        .await?
        .ok_or(AppError::NotFound)?;
    state.cache.invalidate_property(id).await;
    Ok(Json(property))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<BookingStats>> {
    Ok(Json(state.store.booking_stats().await?))
}

pub async fn invalidate_cache(State(state): State<AppState>, _admin: AdminUser) -> Json<CacheStats> {
    state.cache.invalidate_all();
    Json(state.cache.stats())
}
