//! Rating aggregator
//!
//! Recomputes an accommodation's rating from the full set of its reviews
//! after every review mutation.

use std::sync::Arc;

use stayhub_core::{
    models::RatingSummary,
    traits::{AccommodationRepository, ReviewRepository},
    AppResult,
};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Average and count over a set of ratings; zero when empty
pub fn summarize(ratings: impl IntoIterator<Item = i16>) -> RatingSummary {
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), r| (sum + i64::from(r), count + 1));

    if count == 0 {
        return RatingSummary::default();
    }

    RatingSummary {
        average_rating: sum as f64 / count as f64,
        reviews_count: count,
    }
}

pub struct RatingAggregator {
    reviews: Arc<dyn ReviewRepository>,
    accommodations: Arc<dyn AccommodationRepository>,
}

impl RatingAggregator {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        accommodations: Arc<dyn AccommodationRepository>,
    ) -> Self {
        Self {
            reviews,
            accommodations,
        }
    }

    /// Recompute and store the rating summary of an accommodation
    #[instrument(skip(self))]
    pub async fn recompute(&self, accommodation_id: Uuid) -> AppResult<RatingSummary> {
        let reviews = self.reviews.list_for_accommodation(accommodation_id).await?;
        let summary = summarize(reviews.iter().map(|r| r.rating));

        self.accommodations
            .set_rating_summary(accommodation_id, summary)
            .await?;

        debug!(
            "Accommodation {} rating {:.2} over {} review(s)",
            accommodation_id, summary.average_rating, summary.reviews_count
        );
        Ok(summary)
    }
}
