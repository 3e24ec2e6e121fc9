//! Bearer sessions and the `AuthUser` / `AdminUser` extractors

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserProfile;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Opaque-token sessions held in a TTL cache
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(1_000_000)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Start a session for `user_id` and return its token
    pub async fn create(&self, user_id: Uuid) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.sessions
            .insert(
                token.clone(),
                Session {
                    user_id,
                    created_at: Utc::now(),
                },
            )
            .await;
        token
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).await
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Signed-in user, resolved from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile: UserProfile,
    pub is_admin: bool,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))?;

        let session = state.sessions.get(token).await.ok_or_else(|| {
            AppError::Unauthorized("Session expired, please sign in again".to_string())
        })?;

        let profile = state
            .store
            .get_profile(session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        Ok(AuthUser {
            is_admin: state.config.is_admin(&profile.phone),
            profile,
            token: token.to_string(),
        })
    }
}

/// Signed-in user whose phone is listed in `ADMIN_PHONES`
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            tracing::warn!(user_id = %user.profile.id, "Admin endpoint refused");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
