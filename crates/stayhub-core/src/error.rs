//! Unified error handling for StayHub
//!
//! This module provides a single error type covering the booking engine's
//! failure taxonomy plus the ambient failures (auth, config, serialization),
//! with automatic HTTP response mapping.

use crate::models::{BookingConflict, BookingStatus};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Persistence Errors ====================
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    // ==================== Authentication Errors ====================
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ==================== Booking Errors ====================
    #[error("Invalid date range: check-out {check_out} must be after check-in {check_in}")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Room is already booked for {} overlapping stay(s)", conflicts.len())]
    DateConflict { conflicts: Vec<BookingConflict> },

    #[error("Room unavailable: {0}")]
    RoomUnavailable(String),

    #[error("Cannot {action} a booking in status {from}")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    // ==================== Payment Errors ====================
    #[error("Booking already paid: {0}")]
    AlreadyPaid(String),

    #[error("Booking cancelled: {0}")]
    BookingCancelled(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    // ==================== Notification Errors ====================
    #[error("Notification failed: {0}")]
    Notification(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidDateRange { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::InvalidToken(_) | AppError::TokenExpired | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::DateConflict { .. }
            | AppError::RoomUnavailable(_)
            | AppError::InvalidTransition { .. }
            | AppError::AlreadyPaid(_)
            | AppError::BookingCancelled(_)
            | AppError::AlreadyExists(_) => StatusCode::CONFLICT,

            // 502 Bad Gateway
            AppError::PaymentProvider(_) | AppError::Notification(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            AppError::Persistence(_)
            | AppError::Internal(_)
            | AppError::Config(_)
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Persistence(_) => "persistence_error",
            AppError::Pool(_) => "pool_error",
            AppError::TokenExpired => "token_expired",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidDateRange { .. } => "invalid_date_range",
            AppError::DateConflict { .. } => "date_conflict",
            AppError::RoomUnavailable(_) => "room_unavailable",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::AlreadyPaid(_) => "already_paid",
            AppError::BookingCancelled(_) => "booking_cancelled",
            AppError::PaymentProvider(_) => "payment_provider_error",
            AppError::Notification(_) => "notification_error",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the caller may safely re-invoke the failed operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::PaymentProvider(_) | AppError::Pool(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        if let AppError::DateConflict { conflicts } = self {
            body["details"] = json!({ "conflicts": conflicts });
        }
        if self.is_retryable() {
            body["retryable"] = json!(true);
        }

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => AppError::Pool(err.to_string()),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InvalidDateRange {
                check_in: date(2024, 1, 4),
                check_out: date(2024, 1, 1),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("booking".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: BookingStatus::Cancelled,
                action: "cancel",
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::PaymentProvider("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Persistence("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::AlreadyPaid("b1".to_string()).error_code(),
            "already_paid"
        );
        assert_eq!(
            AppError::DateConflict { conflicts: vec![] }.error_code(),
            "date_conflict"
        );
    }

    #[test]
    fn test_retryable_only_for_provider_errors() {
        assert!(AppError::PaymentProvider("503".to_string()).is_retryable());
        assert!(!AppError::AlreadyPaid("b1".to_string()).is_retryable());
        assert!(!AppError::Forbidden("not owner".to_string()).is_retryable());
    }

    #[test]
    fn test_date_conflict_response_carries_intervals() {
        let conflict = BookingConflict {
            booking_id: Uuid::new_v4(),
            check_in: date(2024, 1, 10),
            check_out: date(2024, 1, 15),
        };
        let err = AppError::DateConflict {
            conflicts: vec![conflict],
        };

        assert_eq!(err.to_string(), "Room is already booked for 1 overlapping stay(s)");

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = AppError::InvalidTransition {
            from: BookingStatus::Completed,
            action: "update",
        };
        assert_eq!(err.to_string(), "Cannot update a booking in status completed");
    }
}
