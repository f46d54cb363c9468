//! Review models

use crate::error::AppError;
use crate::AppResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest accepted rating
pub const MIN_RATING: i16 = 1;

/// Highest accepted rating
pub const MAX_RATING: i16 = 5;

/// Reject ratings outside 1..=5
pub fn validate_rating(rating: i16) -> AppResult<i16> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )));
    }
    Ok(rating)
}

/// Review entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub accommodation_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Create a new review, validating the rating
    pub fn new(
        accommodation_id: Uuid,
        user_id: Uuid,
        rating: i16,
        comment: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            accommodation_id,
            user_id,
            rating: validate_rating(rating)?,
            comment,
            created_at: Utc::now(),
            updated_at: None,
        })
    }
}

/// Aggregate rating figures stored on an accommodation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub reviews_count: i64,
}
