//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::booking::BookingError;
use crate::notify::NotifyError;
use crate::payments::PaymentError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Admin access required")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    RateLimited(String),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::Booking(e) => match e {
                BookingError::Unavailable { .. } => (StatusCode::CONFLICT, "unavailable"),
                BookingError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "invalid_transition")
                }
                BookingError::NotOwner => (StatusCode::FORBIDDEN, "forbidden"),
                _ => (StatusCode::BAD_REQUEST, "invalid_booking"),
            },
            AppError::Payment(e) => match e {
                PaymentError::NotConfigured(_) => (StatusCode::BAD_REQUEST, "payment_unavailable"),
                PaymentError::InvalidSignature | PaymentError::Malformed(_) => {
                    (StatusCode::BAD_REQUEST, "payment_verification_failed")
                }
                PaymentError::AmountMismatch { .. } => {
                    (StatusCode::BAD_REQUEST, "payment_verification_failed")
                }
                PaymentError::Http(_) | PaymentError::Gateway { .. } => {
                    (StatusCode::BAD_GATEWAY, "payment_gateway_error")
                }
            },
            AppError::Notify(_) => (StatusCode::BAD_GATEWAY, "messaging_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            AppError::Payment(e) if status == StatusCode::BAD_GATEWAY => {
                tracing::warn!("Payment gateway error: {}", e);
                "Payment provider is unavailable, please try again".to_string()
            }
            AppError::Notify(e) => {
                tracing::warn!("Messaging error: {}", e);
                "Could not deliver the message, please try again".to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            AppError::Booking(BookingError::Unavailable { conflicts }) => {
                serde_json::to_value(conflicts).ok()
            }
            _ => None,
        };

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound.status_and_type().0, StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::RateLimited("slow down".into()).status_and_type().0,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Booking(BookingError::PetsNotAllowed).status_and_type(),
            (StatusCode::BAD_REQUEST, "invalid_booking")
        );
        assert_eq!(
            AppError::Booking(BookingError::Unavailable { conflicts: vec![] })
                .status_and_type()
                .0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Payment(PaymentError::InvalidSignature).status_and_type().0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_database_error_message_is_generic() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
