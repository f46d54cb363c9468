//! Repository implementations
//!
//! Concrete PostgreSQL implementations of the repository traits defined in
//! stayhub-core, using sqlx.

pub mod accommodation_repo;
pub mod booking_repo;
pub mod payment_repo;
pub mod review_repo;
pub mod user_repo;

pub use accommodation_repo::PgAccommodationRepository;
pub use booking_repo::PgBookingRepository;
pub use payment_repo::PgPaymentRepository;
pub use review_repo::PgReviewRepository;
pub use user_repo::PgUserRepository;

/// unique_violation
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// exclusion_violation, raised by the booking overlap constraint
pub(crate) const EXCLUSION_VIOLATION: &str = "23P01";

/// SQLSTATE of a database error, if the error came from the server
pub(crate) fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}
