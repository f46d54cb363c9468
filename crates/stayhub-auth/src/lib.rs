//! Authentication and authorization for StayHub
//!
//! Tokens are issued elsewhere (the account service); this crate validates
//! them and turns them into a [`Principal`](stayhub_core::models::Principal)
//! for the booking engine.
//!
//! # Examples
//!
//! ```no_run
//! use stayhub_auth::{Claims, JwtService};
//! use uuid::Uuid;
//!
//! let jwt_service = JwtService::new("your-secret-key", 3600);
//! let token = jwt_service.create_token(&Claims::new(Uuid::new_v4(), "guest@example.com", false))?;
//! let principal = jwt_service.validate_token(&token)?.principal()?;
//! # Ok::<(), stayhub_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AdminUser, AuthenticatedUser};
