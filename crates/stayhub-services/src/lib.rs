//! Booking lifecycle engine for StayHub
//!
//! This crate holds the business logic that sits between the HTTP layer and
//! storage: pricing, availability, the booking state machine, payment
//! reconciliation, rating aggregation and proximity ranking, plus the
//! Paystack and SMTP adapters for the external collaborators.
//!
//! # Architecture
//!
//! Services receive their repositories and collaborators as `Arc<dyn Trait>`
//! at construction. Nothing here holds a global store handle, so every
//! service runs unchanged against PostgreSQL or `stayhub_db::MemoryStore`.
//!
//! # Services
//!
//! - `AvailabilityChecker` - Overlap scan over a room's active bookings
//! - `CatalogService` - Listing browse, popular list and admin maintenance
//! - `BookingManager` - Booking creation and the status state machine
//! - `PaymentReconciler` - Payment initiation and verification
//! - `RatingAggregator` - Full recompute of an accommodation's rating
//! - `ReviewService` - Review create/update/delete with recompute
//! - `SearchService` - "Near me" and bounding-box search
//! - `FavoritesService` - Per-user favorite accommodations

pub mod availability;
pub mod booking_manager;
pub mod catalog;
pub mod favorites;
pub mod notifier;
pub mod payment_reconciler;
pub mod paystack;
pub mod pricing;
pub mod proximity;
pub mod rating_aggregator;
pub mod reviews;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

pub use availability::{Availability, AvailabilityChecker};
pub use booking_manager::{BookingFilter, BookingManager, BookingUpdate, CreateBooking};
pub use catalog::{
    AccommodationChanges, CatalogEntry, CatalogQuery, CatalogService, CatalogSort,
    DashboardStats, NewAccommodation, RoomChanges,
};
pub use favorites::FavoritesService;
pub use notifier::{LogNotifier, SmtpNotifier};
pub use payment_reconciler::{PaymentInitiation, PaymentReconciler, PaymentVerification};
pub use paystack::PaystackGateway;
pub use rating_aggregator::RatingAggregator;
pub use reviews::{ReviewService, ReviewUpdate};
pub use search::{SearchFilters, SearchHit, SearchService};

/// Business logic constants
pub mod constants {
    /// Mean Earth radius used by the haversine formula, in meters
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

    /// Prefix of generated payment references
    pub const PAYMENT_REFERENCE_PREFIX: &str = "ACCOM-";

    /// Number of uppercase hex characters after the prefix
    pub const PAYMENT_REFERENCE_HEX_LEN: usize = 10;

    /// Minor currency units per major unit (kobo per naira)
    pub const MINOR_UNITS_PER_MAJOR: i64 = 100;
}
