//! Review DTOs

use serde::Deserialize;
use stayhub_services::ReviewUpdate;
use validator::Validate;

/// Review creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    /// Rating from 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    /// Free-form comment
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Review update request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    /// New rating
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,

    /// New comment
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

impl From<UpdateReviewRequest> for ReviewUpdate {
    fn from(req: UpdateReviewRequest) -> Self {
        Self {
            rating: req.rating,
            comment: req.comment,
        }
    }
}
