//! Data Transfer Objects (DTOs) for API requests and responses

pub mod accommodation;
pub mod booking;
pub mod catalog;
pub mod common;
pub mod payment;
pub mod review;

pub use accommodation::*;
pub use booking::*;
pub use catalog::*;
pub use common::*;
pub use payment::*;
pub use review::*;
