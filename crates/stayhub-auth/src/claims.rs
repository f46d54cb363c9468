//! JWT Claims structure
//!
//! The token carries everything the booking engine needs to build a
//! [`Principal`], so authenticated requests never hit the users table.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use stayhub_core::error::AppError;
use stayhub_core::models::Principal;
use uuid::Uuid;

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

fn default_active() -> bool {
    true
}

impl Claims {
    /// Create claims for a user; expiration is filled in by `JwtService`
    ///
    /// # Examples
    ///
    /// ```
    /// use stayhub_auth::Claims;
    /// use uuid::Uuid;
    ///
    /// let id = Uuid::new_v4();
    /// let claims = Claims::new(id, "guest@example.com", false);
    /// assert_eq!(claims.sub, id.to_string());
    /// assert!(claims.is_active);
    /// ```
    pub fn new(user_id: Uuid, email: &str, is_admin: bool) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            is_admin,
            is_active: true,
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create claims with a custom expiration, relative to now
    pub fn with_expiration(
        user_id: Uuid,
        email: &str,
        is_admin: bool,
        expires_in_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            ..Self::new(user_id, email, is_admin)
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::InvalidToken(format!("subject '{}' is not a user id", self.sub)))
    }

    /// Build the caller identity carried by this token
    pub fn principal(&self) -> Result<Principal, AppError> {
        Ok(Principal {
            id: self.user_id()?,
            email: self.email.clone(),
            is_active: self.is_active,
            is_admin: self.is_admin,
        })
    }
}
