//! Domain models for StayHub
//!
//! This module contains all the core domain models used throughout the application.

pub mod accommodation;
pub mod booking;
pub mod payment;
pub mod review;
pub mod user;

pub use accommodation::{Accommodation, AccommodationType, GeoBounds, GeoPoint, Room};
pub use booking::{
    Booking, BookingConflict, BookingGuard, BookingPatch, BookingStatus, PaymentStatus, StayDates,
};
pub use payment::{
    GatewayVerification, Payment, PaymentAuthorization, PaymentMethod, Settlement,
    VerificationOutcome,
};
pub use review::{validate_rating, RatingSummary, Review, MAX_RATING, MIN_RATING};
pub use user::{Principal, UserProfile};
