//! Booking route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::Booking;
use crate::AppState;

use super::requests::{AvailabilityQuery, CreateBookingRequest};
use super::responses::AvailabilityResponse;
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/properties/:id/availability", get(availability))
        .route("/api/bookings", post(create))
        .route("/api/bookings/:id", get(detail))
        .route("/api/bookings/:id/cancel", post(cancel))
}

pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let response =
        services::check_availability(state.store.as_ref(), id, query.check_in, query.check_out)
            .await?;
    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = services::create_booking(
        state.store.as_ref(),
        &state.pricing,
        &user,
        request,
        Utc::now().date_naive(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(
        services::get_booking_for(state.store.as_ref(), id, &user).await?,
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(
        services::cancel_booking(state.store.as_ref(), id, &user).await?,
    ))
}
