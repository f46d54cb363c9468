//! Booking DTOs
//!
//! Request and response types for booking endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stayhub_core::{
    models::{Booking, BookingStatus, PaymentStatus},
    AppError,
};
use stayhub_services::{BookingFilter, BookingUpdate, CreateBooking};
use uuid::Uuid;
use validator::Validate;

use super::common::PaginationParams;

/// Booking creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// Accommodation to book
    pub accommodation_id: Uuid,

    /// Index of the room within the accommodation
    #[serde(alias = "room_id")]
    #[validate(range(min = 0, message = "Room index must not be negative"))]
    pub room_index: i32,

    /// First night
    pub check_in: NaiveDate,

    /// Departure day; the night before is the last one booked
    pub check_out: NaiveDate,

    /// Number of guests
    #[validate(range(min = 1, message = "At least one guest is required"))]
    pub guests: i32,

    /// Free-form requests for the host
    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,
}

impl From<CreateBookingRequest> for CreateBooking {
    fn from(req: CreateBookingRequest) -> Self {
        Self {
            accommodation_id: req.accommodation_id,
            room_index: req.room_index,
            check_in: req.check_in,
            check_out: req.check_out,
            guests: req.guests,
            special_requests: req.special_requests,
        }
    }
}

/// Booking update request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    /// New special requests; omitted or null clears them
    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,
}

impl From<UpdateBookingRequest> for BookingUpdate {
    fn from(req: UpdateBookingRequest) -> Self {
        Self {
            special_requests: req.special_requests,
        }
    }
}

/// Parse an optional status query value
pub fn parse_booking_status(status: Option<&str>) -> Result<Option<BookingStatus>, AppError> {
    match status {
        None | Some("") => Ok(None),
        Some(s) => BookingStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Unknown booking status '{}'", s))),
    }
}

/// Query for the caller's own bookings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListQuery {
    /// Status filter
    pub status: Option<String>,
}

/// Query for the admin booking listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBookingQuery {
    /// Pagination
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Status filter
    pub status: Option<String>,

    /// Accommodation filter
    pub accommodation_id: Option<Uuid>,
}

impl AdminBookingQuery {
    /// Convert to the service-level filter
    pub fn filter(&self) -> Result<BookingFilter, AppError> {
        Ok(BookingFilter {
            status: parse_booking_status(self.status.as_deref())?,
            accommodation_id: self.accommodation_id,
        })
    }
}

/// Query for triggering check-in reminders
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderQuery {
    /// Check-in date to remind about
    pub date: NaiveDate,
}

/// Reminder run result
#[derive(Debug, Clone, Serialize)]
pub struct ReminderResponse {
    /// Check-in date
    pub date: NaiveDate,
    /// Reminders delivered
    pub sent: usize,
}

/// Booking response
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    /// Booking ID
    pub id: Uuid,
    /// Accommodation ID
    pub accommodation_id: Uuid,
    /// Room index
    pub room_index: i32,
    /// Owning user
    pub user_id: Uuid,
    /// Check-in date
    pub check_in: NaiveDate,
    /// Check-out date
    pub check_out: NaiveDate,
    /// Number of nights
    pub nights: i64,
    /// Number of guests
    pub guests: i32,
    /// Price of the stay
    pub total_price: Decimal,
    /// Booking status
    pub booking_status: BookingStatus,
    /// Payment status
    pub payment_status: PaymentStatus,
    /// Latest payment reference
    pub payment_reference: Option<String>,
    /// Guest requests
    pub special_requests: Option<String>,
    /// Created at
    pub created_at: DateTime<Utc>,
    /// Updated at
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            nights: (b.check_out - b.check_in).num_days(),
            id: b.id,
            accommodation_id: b.accommodation_id,
            room_index: b.room_index,
            user_id: b.user_id,
            check_in: b.check_in,
            check_out: b.check_out,
            guests: b.guests,
            total_price: b.total_price,
            booking_status: b.booking_status,
            payment_status: b.payment_status,
            payment_reference: b.payment_reference,
            special_requests: b.special_requests,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            accommodation_id: Uuid::new_v4(),
            room_index: 0,
            check_in: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            guests: 2,
            special_requests: None,
        }
    }

    #[test]
    fn test_create_booking_validation() {
        assert!(request().validate().is_ok());

        let mut no_guests = request();
        no_guests.guests = 0;
        assert!(no_guests.validate().is_err());

        let mut bad_room = request();
        bad_room.room_index = -1;
        assert!(bad_room.validate().is_err());
    }

    #[test]
    fn test_room_id_alias() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "accommodation_id": Uuid::nil(),
            "room_id": 2,
            "check_in": "2024-01-01",
            "check_out": "2024-01-02",
            "guests": 1
        }))
        .unwrap();
        assert_eq!(req.room_index, 2);
        assert!(req.special_requests.is_none());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_booking_status(None).unwrap(), None);
        assert_eq!(
            parse_booking_status(Some("Confirmed")).unwrap(),
            Some(BookingStatus::Confirmed)
        );
        assert!(parse_booking_status(Some("lost")).is_err());
    }
}
