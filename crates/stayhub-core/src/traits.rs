//! Common traits for repositories and collaborators
//!
//! The booking engine never talks to storage, the payment provider, or the
//! mail server directly: each is injected behind one of these traits so the
//! services can run against PostgreSQL in production and an in-memory store
//! in tests.
//!
//! Storage is assumed to offer atomic single-record updates only.
//! `increment_total_bookings`, `BookingRepository::apply` and
//! `PaymentRepository::settle` must each be one atomic operation, never a
//! read-modify-write.

use crate::error::AppError;
use crate::models::{
    Accommodation, AccommodationType, Booking, BookingGuard, BookingPatch, BookingStatus,
    GatewayVerification, GeoBounds, Payment, PaymentAuthorization, PaymentStatus, RatingSummary,
    Review, Settlement, UserProfile,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Generic repository trait for lookup and insertion
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;
}

/// Accommodation repository trait with specialized methods
#[async_trait]
pub trait AccommodationRepository: Repository<Accommodation, Uuid> {
    /// Find several accommodations at once; missing ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Accommodation>, AppError>;

    /// Active accommodations whose coordinates fall inside `bounds`
    async fn find_in_bounds(&self, bounds: &GeoBounds) -> Result<Vec<Accommodation>, AppError>;

    /// Active accommodations, optionally of one type, best rated first
    async fn find_active(
        &self,
        accommodation_type: Option<AccommodationType>,
    ) -> Result<Vec<Accommodation>, AppError>;

    /// Active accommodations with the most bookings, ties broken by rating
    async fn find_popular(&self, limit: i64) -> Result<Vec<Accommodation>, AppError>;

    /// Overwrite descriptive fields, rooms and the active flag
    ///
    /// `total_bookings` and the rating summary are never written here.
    async fn update(&self, entity: &Accommodation) -> Result<Accommodation, AppError>;

    /// Atomically add `delta` to `total_bookings`
    async fn increment_total_bookings(&self, id: Uuid, delta: i64) -> Result<(), AppError>;

    /// Write `average_rating` and `reviews_count` in a single update
    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> Result<(), AppError>;

    /// Count all accommodations
    async fn count(&self) -> Result<i64, AppError>;
}

/// Booking repository trait with specialized methods
#[async_trait]
pub trait BookingRepository: Repository<Booking, Uuid> {
    /// Bookings on one room whose status is in `statuses`
    async fn find_for_room(
        &self,
        accommodation_id: Uuid,
        room_index: i32,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Booking>, AppError>;

    /// Bookings owned by a user, newest first
    async fn list_by_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, AppError>;

    /// All bookings with filtering, newest first
    async fn list_filtered(
        &self,
        status: Option<BookingStatus>,
        accommodation_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64), AppError>;

    /// Check if the user holds a booking for the accommodation in one of `statuses`
    async fn exists_for_user(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
        statuses: &[BookingStatus],
    ) -> Result<bool, AppError>;

    /// Bookings with the given status checking in on `date`
    async fn list_checking_in(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, AppError>;

    /// Atomically apply `patch` if the booking currently satisfies `guard`
    ///
    /// Returns `None` when the booking does not exist or the guard failed.
    async fn apply(
        &self,
        id: Uuid,
        guard: &BookingGuard,
        patch: &BookingPatch,
    ) -> Result<Option<Booking>, AppError>;
}

/// Payment repository trait with specialized methods
#[async_trait]
pub trait PaymentRepository: Repository<Payment, Uuid> {
    /// Find payment by provider reference
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, AppError>;

    /// Record a verification result, never overwriting `paid`
    ///
    /// Returns `None` when no payment has this reference.
    async fn settle(
        &self,
        reference: &str,
        status: PaymentStatus,
        provider_response: &serde_json::Value,
    ) -> Result<Option<Settlement>, AppError>;
}

/// Review repository trait with specialized methods
#[async_trait]
pub trait ReviewRepository: Repository<Review, Uuid> {
    /// Find the review a user left for an accommodation
    async fn find_by_user_and_accommodation(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
    ) -> Result<Option<Review>, AppError>;

    /// All reviews of an accommodation, newest first
    async fn list_for_accommodation(&self, accommodation_id: Uuid)
        -> Result<Vec<Review>, AppError>;

    /// Update rating and comment of an existing review
    async fn update(&self, review: &Review) -> Result<Review, AppError>;

    /// Delete review by ID
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// User repository trait with specialized methods
#[async_trait]
pub trait UserRepository: Repository<UserProfile, Uuid> {
    /// Add an accommodation to the user's favorites; returns false if already present
    async fn add_favorite(&self, user_id: Uuid, accommodation_id: Uuid) -> Result<bool, AppError>;

    /// Remove an accommodation from the user's favorites; returns false if absent
    async fn remove_favorite(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
    ) -> Result<bool, AppError>;

    /// Count all users
    async fn count(&self) -> Result<i64, AppError>;
}

/// Checkout request sent to the payment gateway
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationRequest {
    pub email: String,
    /// Amount in major currency units
    pub amount: Decimal,
    pub callback_url: Option<String>,
    pub metadata: serde_json::Value,
}

/// External payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout and obtain its reference and authorization handle
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<PaymentAuthorization, AppError>;

    /// Ask the provider for the verdict on a transaction
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, AppError>;
}

/// Outbound guest notifications
///
/// Callers log and discard errors; a failed notification never undoes
/// committed state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_booking_created(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> Result<(), AppError>;

    async fn notify_payment_receipt(
        &self,
        payment: &Payment,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> Result<(), AppError>;

    /// A paid booking lost its room to an earlier confirmation
    async fn notify_booking_auto_cancelled(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> Result<(), AppError>;

    async fn notify_booking_reminder(
        &self,
        booking: &Booking,
        accommodation: &Accommodation,
        user: &UserProfile,
    ) -> Result<(), AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Pagination {
    /// Largest accepted page size
    pub const MAX_PER_PAGE: i64 = 100;

    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Slice an already-ordered result set
    pub fn apply<T>(&self, items: Vec<T>) -> PaginatedResponse<T> {
        let total = items.len() as i64;
        let data = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .collect();

        PaginatedResponse {
            data,
            pagination: PaginationMeta::new(total, self.page, self.per_page),
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);

        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination::new(0, 10); // page 0 becomes 1
        assert_eq!(p.page, 1);

        let p = Pagination::new(1, 2000); // per_page capped at 100
        assert_eq!(p.per_page, 100);
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(95, 1, 10);
        assert_eq!(meta.total_pages, 10);

        let meta = PaginationMeta::new(101, 1, 10);
        assert_eq!(meta.total_pages, 11);
    }

    #[test]
    fn test_apply_slices_page() {
        let items: Vec<i32> = (1..=25).collect();

        let page = Pagination::new(3, 10).apply(items.clone());
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);

        let past_end = Pagination::new(4, 10).apply(items);
        assert!(past_end.data.is_empty());
    }
}
