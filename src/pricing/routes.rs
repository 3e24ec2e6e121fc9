//! Pricing route handlers

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;

use crate::booking::services::{check_availability, quote_stay};
use crate::error::Result;
use crate::AppState;

use super::requests::QuoteRequest;
use super::responses::QuoteResponse;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/pricing/quote", post(quote))
}

/// Price a stay and report whether its dates are currently free
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let store = state.store.as_ref();
    let stay = request.stay();

    let price = quote_stay(
        store,
        &state.pricing,
        request.property_id,
        &stay,
        Utc::now().date_naive(),
    )
    .await?;
    let availability =
        check_availability(store, request.property_id, stay.check_in, stay.check_out).await?;

    Ok(Json(QuoteResponse::new(
        request.property_id,
        &price,
        availability.available,
    )))
}
