//! Booking models
//!
//! A booking holds one room of an accommodation for a half-open date range
//! `[check_in, check_out)`. Its lifecycle is driven by two closed status
//! enums: `BookingStatus` (the stay) and `PaymentStatus` (the money).

use crate::error::AppError;
use crate::AppResult;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking status
///
/// ```text
/// pending ──payment confirmed──▶ confirmed ──stay completed──▶ completed
///    │                               │
///    └────────────cancel─────────────┴──────────▶ cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, awaiting payment
    #[default]
    Pending,
    /// Paid and confirmed
    Confirmed,
    /// Cancelled by the guest or automatically
    Cancelled,
    /// Stay finished
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BookingStatus {
    /// Every status, in lifecycle order
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    /// Statuses that hold the room against other bookings
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    /// Statuses that entitle the guest to review the accommodation
    pub const REVIEWABLE: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Check if the booking still holds its room
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Check if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Check whether `next` is a legal edge of the state machine
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        match (self, next) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Pending, BookingStatus::Cancelled) => true,
            (BookingStatus::Confirmed, BookingStatus::Cancelled) => true,
            (BookingStatus::Confirmed, BookingStatus::Completed) => true,
            (BookingStatus::Pending, _)
            | (BookingStatus::Confirmed, _)
            | (BookingStatus::Cancelled, _)
            | (BookingStatus::Completed, _) => false,
        }
    }
}

/// Payment status, shared by bookings and payment records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// Check if a payment can still be collected
    pub fn is_payable(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Failed)
    }
}

/// Check-in / check-out pair with `check_out > check_in` guaranteed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    /// Build a stay, failing with `InvalidDateRange` unless check-out is after check-in
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> AppResult<Self> {
        if check_out <= check_in {
            return Err(AppError::InvalidDateRange {
                check_in,
                check_out,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights, always >= 1
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open overlap test against another `[check_in, check_out)` interval
    #[inline]
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        check_in < self.check_out && check_out > self.check_in
    }
}

/// An existing booking that collides with a requested stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConflict {
    pub booking_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl From<&Booking> for BookingConflict {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            check_in: booking.check_in,
            check_out: booking.check_out,
        }
    }
}

/// Booking entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: Uuid,

    /// Booked accommodation
    pub accommodation_id: Uuid,

    /// Position of the room within the accommodation's room list
    pub room_index: i32,

    /// Owning user
    pub user_id: Uuid,

    pub check_in: NaiveDate,
    pub check_out: NaiveDate,

    /// Number of guests
    pub guests: i32,

    /// Price for the whole stay, fixed at creation
    pub total_price: Decimal,

    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,

    /// Reference of the latest payment initiated for this booking
    pub payment_reference: Option<String>,

    /// Free-form guest requests, the only field guests may edit
    pub special_requests: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new booking in state (pending, pending)
    pub fn new(
        accommodation_id: Uuid,
        room_index: i32,
        user_id: Uuid,
        dates: StayDates,
        guests: i32,
        total_price: Decimal,
        special_requests: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            accommodation_id,
            room_index,
            user_id,
            check_in: dates.check_in(),
            check_out: dates.check_out(),
            guests,
            total_price,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            special_requests,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stay dates of this booking
    pub fn dates(&self) -> AppResult<StayDates> {
        StayDates::new(self.check_in, self.check_out)
    }

    /// Check if `user_id` owns this booking
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Ordering key used to decide which of two colliding bookings came first
    pub fn precedence(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at, self.id)
    }
}

/// Partial update applied to a booking by a compare-and-set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub booking_status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_reference: Option<String>,
    /// `Some(None)` clears the field
    pub special_requests: Option<Option<String>>,
}

impl BookingPatch {
    pub fn status(status: BookingStatus) -> Self {
        Self {
            booking_status: Some(status),
            ..Self::default()
        }
    }

    pub fn payment(status: PaymentStatus) -> Self {
        Self {
            payment_status: Some(status),
            ..Self::default()
        }
    }

    /// Apply the patch in place, bumping `updated_at`
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(status) = self.booking_status {
            booking.booking_status = status;
        }
        if let Some(status) = self.payment_status {
            booking.payment_status = status;
        }
        if let Some(reference) = &self.payment_reference {
            booking.payment_reference = Some(reference.clone());
        }
        if let Some(requests) = &self.special_requests {
            booking.special_requests = requests.clone();
        }
        booking.updated_at = Utc::now();
    }
}

/// Precondition for a booking compare-and-set; empty lists accept any status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingGuard {
    pub booking_status: Vec<BookingStatus>,
    pub payment_status: Vec<PaymentStatus>,
}

impl BookingGuard {
    /// Accept any current state
    pub fn any() -> Self {
        Self::default()
    }

    /// Require the booking status to be one of `statuses`
    pub fn status_in(statuses: &[BookingStatus]) -> Self {
        Self {
            booking_status: statuses.to_vec(),
            payment_status: Vec::new(),
        }
    }

    /// Additionally require the payment status to be one of `statuses`
    pub fn with_payment_in(mut self, statuses: &[PaymentStatus]) -> Self {
        self.payment_status = statuses.to_vec();
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        (self.booking_status.is_empty() || self.booking_status.contains(&booking.booking_status))
            && (self.payment_status.is_empty()
                || self.payment_status.contains(&booking.payment_status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_booking() -> Booking {
        Booking::new(
            Uuid::new_v4(),
            0,
            Uuid::new_v4(),
            StayDates::new(date(2024, 1, 10), date(2024, 1, 15)).unwrap(),
            2,
            dec!(500),
            None,
        )
    }

    #[test]
    fn test_stay_dates_reject_empty_or_reversed_range() {
        assert!(matches!(
            StayDates::new(date(2024, 1, 4), date(2024, 1, 4)),
            Err(AppError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            StayDates::new(date(2024, 1, 4), date(2024, 1, 1)),
            Err(AppError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_stay_dates_nights() {
        let dates = StayDates::new(date(2024, 1, 1), date(2024, 1, 4)).unwrap();
        assert_eq!(dates.nights(), 3);

        // Across a leap day
        let dates = StayDates::new(date(2024, 2, 28), date(2024, 3, 1)).unwrap();
        assert_eq!(dates.nights(), 2);
    }

    #[test]
    fn test_half_open_overlap() {
        let held = StayDates::new(date(2024, 1, 10), date(2024, 1, 15)).unwrap();

        assert!(held.overlaps(date(2024, 1, 12), date(2024, 1, 20)));
        assert!(held.overlaps(date(2024, 1, 10), date(2024, 1, 15)));
        assert!(held.overlaps(date(2024, 1, 11), date(2024, 1, 12)));
        assert!(held.overlaps(date(2024, 1, 1), date(2024, 1, 31)));

        // Adjacent stays share a turnover day but do not overlap
        assert!(!held.overlaps(date(2024, 1, 15), date(2024, 1, 20)));
        assert!(!held.overlaps(date(2024, 1, 5), date(2024, 1, 10)));
    }

    #[test]
    fn test_booking_status_transitions() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));

        for next in BookingStatus::ALL {
            assert!(!Cancelled.can_transition_to(next));
            assert!(!Completed.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::from_str("PAID"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::from_str("unknown"), None);
        assert_eq!(BookingStatus::from_str(""), None);
    }

    #[test]
    fn test_new_booking_starts_pending_pending() {
        let booking = sample_booking();
        assert_eq!(booking.booking_status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert!(booking.payment_reference.is_none());
    }

    #[test]
    fn test_patch_and_guard() {
        let mut booking = sample_booking();

        let guard = BookingGuard::status_in(&BookingStatus::ACTIVE)
            .with_payment_in(&[PaymentStatus::Pending, PaymentStatus::Failed]);
        assert!(guard.matches(&booking));

        BookingPatch {
            payment_status: Some(PaymentStatus::Paid),
            booking_status: Some(BookingStatus::Confirmed),
            ..BookingPatch::default()
        }
        .apply_to(&mut booking);

        assert_eq!(booking.booking_status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert!(!guard.matches(&booking));
        assert!(BookingGuard::any().matches(&booking));
    }

    #[test]
    fn test_patch_clears_special_requests() {
        let mut booking = sample_booking();
        booking.special_requests = Some("late check-in".to_string());

        BookingPatch {
            special_requests: Some(None),
            ..BookingPatch::default()
        }
        .apply_to(&mut booking);

        assert!(booking.special_requests.is_none());
    }
}
