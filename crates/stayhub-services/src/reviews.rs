//! Review management
//!
//! Only guests who have booked an accommodation may review it, once. Every
//! mutation is followed by a full rating recompute.

use std::sync::Arc;

use chrono::Utc;
use stayhub_core::{
    models::{validate_rating, BookingStatus, Principal, Review},
    traits::{AccommodationRepository, BookingRepository, ReviewRepository},
    AppError, AppResult,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::rating_aggregator::RatingAggregator;

/// Fields a reviewer may change
#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    bookings: Arc<dyn BookingRepository>,
    accommodations: Arc<dyn AccommodationRepository>,
    aggregator: RatingAggregator,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        bookings: Arc<dyn BookingRepository>,
        accommodations: Arc<dyn AccommodationRepository>,
    ) -> Self {
        Self {
            aggregator: RatingAggregator::new(reviews.clone(), accommodations.clone()),
            reviews,
            bookings,
            accommodations,
        }
    }

    #[instrument(skip(self, comment, principal), fields(user_id = %principal.id))]
    pub async fn create(
        &self,
        accommodation_id: Uuid,
        rating: i16,
        comment: Option<String>,
        principal: &Principal,
    ) -> AppResult<Review> {
        if self
            .accommodations
            .find_by_id(accommodation_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "Accommodation {}",
                accommodation_id
            )));
        }

        let has_booked = self
            .bookings
            .exists_for_user(principal.id, accommodation_id, &BookingStatus::REVIEWABLE)
            .await?;
        if !has_booked {
            return Err(AppError::Forbidden(
                "You can only review accommodations you have booked".to_string(),
            ));
        }

        if self
            .reviews
            .find_by_user_and_accommodation(principal.id, accommodation_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(
                "You have already reviewed this accommodation".to_string(),
            ));
        }

        let review = Review::new(accommodation_id, principal.id, rating, comment)?;
        let review = self.reviews.create(&review).await?;

        info!("Review {} created for {}", review.id, accommodation_id);
        self.aggregator.recompute(accommodation_id).await?;

        Ok(review)
    }

    /// Update one's own review of `accommodation_id`
    ///
    /// Reviews of other users or of another accommodation are `NotFound`.
    #[instrument(skip(self, update, principal), fields(user_id = %principal.id))]
    pub async fn update(
        &self,
        accommodation_id: Uuid,
        review_id: Uuid,
        update: ReviewUpdate,
        principal: &Principal,
    ) -> AppResult<Review> {
        let mut review = match self.find_for(accommodation_id, review_id).await? {
            r if r.user_id == principal.id => r,
            _ => return Err(AppError::NotFound(format!("Review {}", review_id))),
        };

        if let Some(rating) = update.rating {
            review.rating = validate_rating(rating)?;
        }
        if let Some(comment) = update.comment {
            review.comment = Some(comment);
        }
        review.updated_at = Some(Utc::now());

        let review = self.reviews.update(&review).await?;
        self.aggregator.recompute(review.accommodation_id).await?;

        Ok(review)
    }

    /// Delete a review of `accommodation_id`; allowed for its author and administrators
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn delete(
        &self,
        accommodation_id: Uuid,
        review_id: Uuid,
        principal: &Principal,
    ) -> AppResult<()> {
        let review = self.find_for(accommodation_id, review_id).await?;

        if !principal.can_access(review.user_id) {
            warn!(
                "User {} attempted to delete review {} of another user",
                principal.id, review_id
            );
            return Err(AppError::Forbidden(
                "Not authorized to delete this review".to_string(),
            ));
        }

        if !self.reviews.delete(review_id).await? {
            return Err(AppError::NotFound(format!("Review {}", review_id)));
        }

        self.aggregator.recompute(review.accommodation_id).await?;
        Ok(())
    }

    pub async fn list(&self, accommodation_id: Uuid) -> AppResult<Vec<Review>> {
        self.reviews.list_for_accommodation(accommodation_id).await
    }

    async fn find_for(&self, accommodation_id: Uuid, review_id: Uuid) -> AppResult<Review> {
        match self.reviews.find_by_id(review_id).await? {
            Some(r) if r.accommodation_id == accommodation_id => Ok(r),
            _ => Err(AppError::NotFound(format!("Review {}", review_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, principal, seeded, user};
    use rust_decimal_macros::dec;
    use stayhub_core::models::{Booking, BookingPatch, StayDates, UserProfile};
    use stayhub_db::MemoryStore;

    fn book(store: &MemoryStore, acc: Uuid, guest: &UserProfile, status: BookingStatus) {
        let mut booking = Booking::new(
            acc,
            0,
            guest.id,
            StayDates::new(date(1), date(2)).unwrap(),
            1,
            dec!(100),
            None,
        );
        BookingPatch::status(status).apply_to(&mut booking);
        store.insert_booking(booking);
    }

    fn guests(store: &MemoryStore, acc: Uuid, n: usize) -> Vec<UserProfile> {
        (0..n)
            .map(|_| {
                let guest = user(false);
                store.insert_user(guest.clone());
                book(store, acc, &guest, BookingStatus::Completed);
                guest
            })
            .collect()
    }

    #[tokio::test]
    async fn test_rating_follows_create_and_delete() {
        let (store, acc, _, admin) = seeded();
        let service = ReviewService::new(store.clone(), store.clone(), store.clone());

        let reviewers = guests(&store, acc.id, 3);
        let mut created = Vec::new();
        for (guest, rating) in reviewers.iter().zip([5, 3, 4]) {
            created.push(
                service
                    .create(acc.id, rating, None, &principal(guest))
                    .await
                    .unwrap(),
            );
        }

        let stored = store.accommodation(acc.id).unwrap();
        assert_eq!(stored.average_rating, 4.0);
        assert_eq!(stored.reviews_count, 3);

        service
            .delete(acc.id, created[1].id, &principal(&admin))
            .await
            .unwrap();

        let stored = store.accommodation(acc.id).unwrap();
        assert_eq!(stored.average_rating, 4.5);
        assert_eq!(stored.reviews_count, 2);
    }

    #[tokio::test]
    async fn test_create_requires_booking_and_is_once_only() {
        let (store, acc, guest, _) = seeded();
        let service = ReviewService::new(store.clone(), store.clone(), store.clone());
        let p = principal(&guest);

        assert!(matches!(
            service.create(acc.id, 5, None, &p).await,
            Err(AppError::Forbidden(_))
        ));

        book(&store, acc.id, &guest, BookingStatus::Cancelled);
        assert!(matches!(
            service.create(acc.id, 5, None, &p).await,
            Err(AppError::Forbidden(_))
        ));

        book(&store, acc.id, &guest, BookingStatus::Pending);
        assert!(matches!(
            service.create(acc.id, 0, None, &p).await,
            Err(AppError::Validation(_))
        ));
        service.create(acc.id, 5, None, &p).await.unwrap();
        assert!(matches!(
            service.create(acc.id, 4, None, &p).await,
            Err(AppError::AlreadyExists(_))
        ));

        assert!(matches!(
            service.create(Uuid::new_v4(), 4, None, &p).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_is_owner_only_and_recomputes() {
        let (store, acc, _, admin) = seeded();
        let service = ReviewService::new(store.clone(), store.clone(), store.clone());
        let reviewer = guests(&store, acc.id, 1).remove(0);

        let review = service
            .create(acc.id, 2, Some("noisy".to_string()), &principal(&reviewer))
            .await
            .unwrap();

        assert!(matches!(
            service
                .update(acc.id, review.id, ReviewUpdate::default(), &principal(&admin))
                .await,
            Err(AppError::NotFound(_))
        ));

        let updated = service
            .update(
                acc.id,
                review.id,
                ReviewUpdate {
                    rating: Some(5),
                    comment: None,
                },
                &principal(&reviewer),
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.comment.as_deref(), Some("noisy"));
        assert!(updated.updated_at.is_some());
        assert_eq!(store.accommodation(acc.id).unwrap().average_rating, 5.0);
    }

    #[tokio::test]
    async fn test_delete_by_stranger_forbidden() {
        let (store, acc, guest, _) = seeded();
        let service = ReviewService::new(store.clone(), store.clone(), store.clone());
        let reviewer = guests(&store, acc.id, 1).remove(0);
        let review = service
            .create(acc.id, 3, None, &principal(&reviewer))
            .await
            .unwrap();

        assert!(matches!(
            service.delete(acc.id, review.id, &principal(&guest)).await,
            Err(AppError::Forbidden(_))
        ));
        service
            .delete(acc.id, review.id, &principal(&reviewer))
            .await
            .unwrap();

        let stored = store.accommodation(acc.id).unwrap();
        assert_eq!(stored.average_rating, 0.0);
        assert_eq!(stored.reviews_count, 0);
    }

    #[tokio::test]
    async fn test_review_must_belong_to_accommodation_in_path() {
        let (store, acc, _, admin) = seeded();
        let service = ReviewService::new(store.clone(), store.clone(), store.clone());
        let reviewer = guests(&store, acc.id, 1).remove(0);
        let review = service
            .create(acc.id, 4, None, &principal(&reviewer))
            .await
            .unwrap();

        let elsewhere = Uuid::new_v4();
        assert!(matches!(
            service
                .update(
                    elsewhere,
                    review.id,
                    ReviewUpdate {
                        rating: Some(1),
                        comment: None,
                    },
                    &principal(&reviewer),
                )
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(elsewhere, review.id, &principal(&admin)).await,
            Err(AppError::NotFound(_))
        ));

        let kept = store.review(review.id).unwrap();
        assert_eq!(kept.rating, 4);
        assert_eq!(store.accommodation(acc.id).unwrap().reviews_count, 1);
    }
}
