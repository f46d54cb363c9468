//! StayHub Database Layer
//!
//! This crate provides storage for the StayHub booking engine. It includes:
//!
//! - Connection pool management with sqlx
//! - PostgreSQL repository implementations for all domain entities
//! - Conditional single-statement updates for booking and payment state
//! - An in-memory store implementing the same traits, for tests and local runs

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use sqlx::PgPool;
pub use stayhub_core::{AppError, AppResult};
