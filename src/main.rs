use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vacation_rentals::booking::expiry::start_pending_expiry;
use vacation_rentals::cache::start_cache_warmer;
use vacation_rentals::config::{Config, StoreBackend};
use vacation_rentals::db::{self, PgStore};
use vacation_rentals::notify::{LogNotifier, Notifier, WhatsAppNotifier};
use vacation_rentals::payments::{PaymentGateways, PhonePeGateway, RazorpayGateway};
use vacation_rentals::store::{MemoryStore, Store};
use vacation_rentals::{app, AppState};

const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vacation_rentals=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let pool = db::connect(url)
                .await
                .context("Failed to connect to Postgres")?;
            info!("Connected to Postgres, migrations applied");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match config.whatsapp.clone() {
        Some(whatsapp) => Arc::new(WhatsAppNotifier::new(whatsapp)?),
        None => {
            warn!("WhatsApp not configured; OTP codes will be written to the log");
            Arc::new(LogNotifier)
        }
    };

    let payments = PaymentGateways {
        razorpay: config
            .razorpay
            .clone()
            .map(RazorpayGateway::new)
            .transpose()?
            .map(Arc::new),
        phonepe: config
            .phonepe
            .clone()
            .map(PhonePeGateway::new)
            .transpose()?
            .map(Arc::new),
    };
    info!(
        razorpay = payments.razorpay.is_some(),
        phonepe = payments.phonepe.is_some(),
        "Payment gateways configured"
    );
    if config.sentry_dsn.is_some() {
        info!("SENTRY_DSN set");
    }
    if let Some(id) = &config.analytics_id {
        info!("Analytics id: {}", id);
    }

    let bind_addr = config.bind_addr;
    let pending_ttl = chrono::Duration::from_std(config.pending_booking_ttl)
        .context("PENDING_BOOKING_TTL_MINUTES out of range")?;
    let state = AppState::new(config, store, notifier, payments);

    tokio::spawn(start_cache_warmer(state.cache.clone(), state.store.clone()));
    tokio::spawn(start_pending_expiry(
        state.store.clone(),
        pending_ttl,
        EXPIRY_SWEEP_INTERVAL,
    ));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
