//! API layer for StayHub
//!
//! HTTP handlers for bookings, payments, location search, reviews and
//! favorites. Services are injected as `web::Data` so the same routes run
//! against PostgreSQL in production and the in-memory store in tests.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use dto::{ApiResponse, PaginationParams};
pub use handlers::configure_api;
pub use state::{AppServices, Repositories};
