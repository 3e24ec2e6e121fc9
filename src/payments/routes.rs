//! Payment route handlers: checkout start, Razorpay verification, PhonePe callback

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::booking::requests::CheckoutRequest;
use crate::booking::services::{confirm_payment, get_booking_for, record_payment_failure};
use crate::error::{AppError, Result};
use crate::models::{Booking, BookingStatus, PaymentProvider, PaymentStatus};
use crate::pricing::to_minor_units;
use crate::AppState;

use super::{CheckoutSession, PaymentError};

#[derive(Debug, Deserialize)]
pub struct RazorpayVerifyRequest {
    pub booking_id: Uuid,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct PhonePeCallbackBody {
    pub response: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/:id/checkout", post(checkout))
        .route("/api/payments/razorpay/verify", post(razorpay_verify))
        .route("/api/payments/phonepe/callback", post(phonepe_callback))
}

/// Open a payment with the chosen provider for a pending booking
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>> {
    let booking = get_booking_for(state.store.as_ref(), id, &user).await?;
    if booking.status != BookingStatus::Pending || booking.payment_status == PaymentStatus::Paid {
        return Err(AppError::Conflict(
            "Booking is not awaiting payment".to_string(),
        ));
    }

    let (session, reference) = match request.provider {
        PaymentProvider::Razorpay => {
            let gateway = state.payments.razorpay()?;
            let order = gateway.create_order(&booking).await?;
            let session = CheckoutSession::Razorpay {
                booking_id: booking.id,
                key_id: gateway.key_id().to_string(),
                order_id: order.id.clone(),
                amount: order.amount,
                currency: order.currency,
            };
            (session, order.id)
        }
        PaymentProvider::PhonePe => {
            let checkout = state.payments.phonepe()?.create_payment(&booking).await?;
            let session = CheckoutSession::PhonePe {
                booking_id: booking.id,
                merchant_transaction_id: checkout.merchant_transaction_id.clone(),
                redirect_url: checkout.redirect_url,
            };
            (session, checkout.merchant_transaction_id)
        }
    };

    state
        .store
        .set_payment_reference(booking.id, request.provider, &reference)
        .await?
        .ok_or_else(|| AppError::Conflict("Booking is not awaiting payment".to_string()))?;

    tracing::info!(booking_id = %booking.id, provider = %request.provider, "Checkout started");
    Ok(Json(session))
}

/// Client-side Razorpay success handler posts the checkout result here
pub async fn razorpay_verify(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RazorpayVerifyRequest>,
) -> Result<Json<Booking>> {
    let store = state.store.as_ref();
    get_booking_for(store, request.booking_id, &user).await?;

    let gateway = state.payments.razorpay()?;
    if let Err(e) = gateway.verify_signature(
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
    ) {
        record_payment_failure(
            store,
            request.booking_id,
            PaymentProvider::Razorpay,
            &request.razorpay_order_id,
        )
        .await?;
        return Err(e.into());
    }

    let booking = confirm_payment(
        store,
        state.notifier.as_ref(),
        request.booking_id,
        PaymentProvider::Razorpay,
        &request.razorpay_order_id,
    )
    .await?;
    Ok(Json(booking))
}

/// PhonePe server-to-server callback
pub async fn phonepe_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PhonePeCallbackBody>,
) -> Result<Json<Value>> {
    let x_verify = headers
        .get("X-VERIFY")
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::InvalidSignature)?;

    let callback = state.payments.phonepe()?.decode_callback(x_verify, &body.response)?;
    let reference = callback.data.merchant_transaction_id.as_str();

    let store = state.store.as_ref();
    let booking = store
        .find_booking_by_payment_reference(PaymentProvider::PhonePe, reference)
        .await?
        .ok_or(AppError::NotFound)?;

    let expected = to_minor_units(booking.total_amount).unwrap_or_default();
    if callback.is_paid() && callback.data.amount == expected {
        confirm_payment(
            store,
            state.notifier.as_ref(),
            booking.id,
            PaymentProvider::PhonePe,
            reference,
        )
        .await?;
    } else {
        if callback.is_paid() {
            tracing::error!(
                booking_id = %booking.id,
                "{}",
                PaymentError::AmountMismatch {
                    expected,
                    paid: callback.data.amount
                }
            );
        }
        record_payment_failure(store, booking.id, PaymentProvider::PhonePe, reference).await?;
    }

    Ok(Json(json!({ "success": true })))
}
