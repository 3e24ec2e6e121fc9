//! HTTP routes that are not owned by a domain module

pub mod account;
pub mod admin;
pub mod properties;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(properties::router())
        .merge(account::router())
        .merge(admin::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
