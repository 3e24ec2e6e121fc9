//! Booking API for vacation rental properties.
//!
//! Guests sign in with a WhatsApp OTP, browse properties, get a price quote
//! and book a date range. Payment goes through Razorpay or PhonePe; a verified
//! payment confirms the booking.

pub mod auth;
pub mod booking;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod payments;
pub mod pricing;
pub mod routes;
pub mod store;

use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use auth::{OtpStore, SessionStore};
use cache::AppCache;
use config::Config;
use notify::Notifier;
use payments::PaymentGateways;
use pricing::PricingPolicy;
use store::Store;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: AppCache,
    pub otp: OtpStore,
    pub sessions: SessionStore,
    pub notifier: Arc<dyn Notifier>,
    pub payments: PaymentGateways,
    pub pricing: PricingPolicy,
    pub config: Arc<Config>,
}

impl AppState {
    /// Fresh caches sized from `config`
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        payments: PaymentGateways,
    ) -> Self {
        Self {
            store,
            cache: AppCache::new(),
            otp: OtpStore::new(config.otp_ttl, config.otp_resend_cooldown),
            sessions: SessionStore::new(config.session_ttl),
            notifier,
            payments,
            pricing: config.pricing.clone(),
            config: Arc::new(config),
        }
    }
}

/// Full HTTP application
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(auth::router())
        .merge(pricing::router())
        .merge(booking::router())
        .merge(payments::router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
