//! OTP sign-in route handlers

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::booking::services::log_best_effort;
use crate::error::{AppError, Result};
use crate::models::{Activity, UserProfile};
use crate::AppState;

use super::{normalize_phone, AuthUser, OtpVerdict};

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub phone: String,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub token: String,
    pub expires_in_seconds: u64,
    pub is_new_user: bool,
    pub is_admin: bool,
    pub profile: UserProfile,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/otp/send", post(send_otp))
        .route("/api/auth/otp/verify", post(verify_otp))
        .route("/api/auth/logout", post(logout))
}

fn parse_phone(raw: &str) -> Result<String> {
    normalize_phone(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid phone number: {}", raw)))
}

/// Issue a code and deliver it over the messaging channel
pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>> {
    let phone = parse_phone(&request.phone)?;
    let code = state.otp.issue(&phone).await?;

    if let Err(e) = state.notifier.send_otp(&phone, &code).await {
        // An undeliverable code must not block the next attempt
        state.otp.discard(&phone).await;
        return Err(e.into());
    }

    tracing::info!(phone = %mask_phone(&phone), "OTP sent");
    Ok(Json(SendOtpResponse {
        phone,
        expires_in_seconds: state.otp.ttl_seconds(),
    }))
}

/// Verify a code; first success for a phone creates its profile
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>> {
    let phone = parse_phone(&request.phone)?;

    match state.otp.verify(&phone, request.code.trim()).await {
        OtpVerdict::Accepted => {}
        OtpVerdict::Mismatch { attempts_left } => {
            return Err(AppError::Unauthorized(format!(
                "Incorrect code, {} attempts left",
                attempts_left
            )))
        }
        OtpVerdict::Expired => {
            return Err(AppError::Unauthorized(
                "Code expired, please request a new one".to_string(),
            ))
        }
        OtpVerdict::TooManyAttempts => {
            return Err(AppError::Unauthorized(
                "Too many incorrect attempts, please request a new code".to_string(),
            ))
        }
        OtpVerdict::NotFound => {
            return Err(AppError::Unauthorized(
                "No active code for this number, please request one".to_string(),
            ))
        }
    }

    let (profile, is_new_user) = match state.store.find_profile_by_phone(&phone).await? {
        Some(profile) => (profile, false),
        None => (state.store.create_profile(&phone).await?, true),
    };

    let token = state.sessions.create(profile.id).await;
    log_best_effort(
        state.store.as_ref(),
        profile.id,
        Activity::OtpVerified,
        json!({ "new_user": is_new_user }),
    )
    .await;
    tracing::info!(user_id = %profile.id, is_new_user, "Phone verified");

    Ok(Json(VerifyOtpResponse {
        token,
        expires_in_seconds: state.sessions.ttl_seconds(),
        is_new_user,
        is_admin: state.config.is_admin(&profile.phone),
        profile,
    }))
}

pub async fn logout(State(state): State<AppState>, user: AuthUser) -> StatusCode {
    state.sessions.revoke(&user.token).await;
    StatusCode::NO_CONTENT
}

/// Keep the last four digits for logs
pub fn mask_phone(phone: &str) -> String {
    let visible = phone.len().saturating_sub(4);
    format!("{}{}", "*".repeat(visible), &phone[visible..])
}
