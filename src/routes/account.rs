//! Signed-in user routes: profile, own bookings, favourites, newsletter

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::booking::services::log_best_effort;
use crate::error::{AppError, Result};
use crate::models::{
    looks_like_email, Activity, ActivityEntry, Booking, Favorite, NewsletterSubscription,
    ProfileUpdate, Property, UserProfile,
};
use crate::AppState;

const ACTIVITY_PAGE_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(me).patch(update_me))
        .route("/api/me/bookings", get(my_bookings))
        .route("/api/me/activity", get(my_activity))
        .route("/api/me/favorites", get(favorites))
        .route(
            "/api/me/favorites/:property_id",
            put(add_favorite).delete(remove_favorite),
        )
        .route("/api/newsletter", post(subscribe))
}

pub async fn me(user: AuthUser) -> Json<UserProfile> {
    Json(user.profile)
}

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    update.validate().map_err(AppError::BadRequest)?;

    let profile = state
        .store
        .update_profile(user.profile.id, update)
        .await?
        .ok_or(AppError::NotFound)?;

    log_best_effort(
        state.store.as_ref(),
        profile.id,
        Activity::ProfileUpdated,
        json!({}),
    )
    .await;
    Ok(Json(profile))
}

pub async fn my_bookings(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.store.list_user_bookings(user.profile.id).await?))
}

pub async fn my_activity(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ActivityEntry>>> {
    Ok(Json(
        state
            .store
            .list_activity(user.profile.id, ACTIVITY_PAGE_SIZE)
            .await?,
    ))
}

pub async fn favorites(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Property>>> {
    Ok(Json(state.store.list_favorites(user.profile.id).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Favorite>> {
    let favorite = state.store.add_favorite(user.profile.id, property_id).await?;
    log_best_effort(
        state.store.as_ref(),
        user.profile.id,
        Activity::FavoriteAdded,
        json!({ "property_id": property_id }),
    )
    .await;
    Ok(Json(favorite))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .store
        .remove_favorite(user.profile.id, property_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Subscribe an email; signed-in callers get the subscription linked to them
pub async fn subscribe(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(request): Json<NewsletterRequest>,
) -> Result<Json<NewsletterSubscription>> {
    let email = request.email.trim();
    if !looks_like_email(email) {
        return Err(AppError::BadRequest(format!("Invalid email address: {}", email)));
    }

    let subscription = state
        .store
        .subscribe_newsletter(email, user.map(|u| u.profile.id))
        .await?;
    Ok(Json(subscription))
}
