//! Property browsing route handlers

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Property, PropertyFilter};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/properties", get(list))
        .route("/api/properties/:id", get(detail))
}

/// Active properties matching the query filters
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<PropertyFilter>,
) -> Result<Json<Vec<Property>>> {
    let key = filter.cache_key();
    if let Some(cached) = state.cache.listings.get(&key).await {
        tracing::debug!("Cache HIT for listing: {}", key);
        return Ok(Json((*cached).clone()));
    }

    tracing::debug!("Cache MISS for listing: {}", key);
    let properties = state.store.list_properties(&filter).await?;
    state
        .cache
        .listings
        .insert(key, Arc::new(properties.clone()))
        .await;
    Ok(Json(properties))
}

/// Property detail; inactive properties are hidden
pub async fn detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Property>> {
    let property = match state.cache.properties.get(&id).await {
        Some(cached) => {
            tracing::debug!("Cache HIT for property: {}", id);
            (*cached).clone()
        }
        None => {
            tracing::debug!("Cache MISS for property: {}", id);
            let property = state.store.get_property(id).await?.ok_or(AppError::NotFound)?;
            state
                .cache
                .properties
                .insert(id, Arc::new(property.clone()))
                .await;
            property
        }
    };

    if !property.is_active {
        return Err(AppError::NotFound);
    }
    Ok(Json(property))
}
