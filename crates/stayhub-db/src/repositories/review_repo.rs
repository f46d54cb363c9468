//! Review repository implementation

use super::{sqlstate, UNIQUE_VIOLATION};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stayhub_core::{
    models::{validate_rating, Review},
    traits::{Repository, ReviewRepository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of ReviewRepository
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    /// Create a new review repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Review, Uuid> for PgReviewRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let row = sqlx::query_as::<sqlx::Postgres, ReviewRow>(
            r#"
            SELECT id, accommodation_id, user_id, rating, comment, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding review {}: {}", id, e);
            AppError::Persistence(format!("Failed to find review: {}", e))
        })?;

        row.map(Review::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(accommodation_id = %entity.accommodation_id))]
    async fn create(&self, entity: &Review) -> AppResult<Review> {
        debug!("Creating review by user {}", entity.user_id);

        let row = sqlx::query_as::<sqlx::Postgres, ReviewRow>(
            r#"
            INSERT INTO reviews (id, accommodation_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, accommodation_id, user_id, rating, comment, created_at, updated_at
            "#,
        )
        .bind(entity.id)
        .bind(entity.accommodation_id)
        .bind(entity.user_id)
        .bind(entity.rating)
        .bind(&entity.comment)
        .bind(entity.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if sqlstate(&e).as_deref() == Some(UNIQUE_VIOLATION) {
                AppError::AlreadyExists(
                    "You have already reviewed this accommodation".to_string(),
                )
            } else {
                error!("Database error creating review: {}", e);
                AppError::Persistence(format!("Failed to create review: {}", e))
            }
        })?;

        row.try_into()
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    #[instrument(skip(self))]
    async fn find_by_user_and_accommodation(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
    ) -> AppResult<Option<Review>> {
        let row = sqlx::query_as::<sqlx::Postgres, ReviewRow>(
            r#"
            SELECT id, accommodation_id, user_id, rating, comment, created_at, updated_at
            FROM reviews
            WHERE user_id = $1 AND accommodation_id = $2
            "#,
        )
        .bind(user_id)
        .bind(accommodation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding review: {}", e);
            AppError::Persistence(format!("Failed to find review: {}", e))
        })?;

        row.map(Review::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_for_accommodation(&self, accommodation_id: Uuid) -> AppResult<Vec<Review>> {
        let rows = sqlx::query_as::<sqlx::Postgres, ReviewRow>(
            r#"
            SELECT id, accommodation_id, user_id, rating, comment, created_at, updated_at
            FROM reviews
            WHERE accommodation_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(accommodation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error listing reviews of {}: {}",
                accommodation_id, e
            );
            AppError::Persistence(format!("Failed to list reviews: {}", e))
        })?;

        rows.into_iter().map(Review::try_from).collect()
    }

    #[instrument(skip(self, review), fields(review_id = %review.id))]
    async fn update(&self, review: &Review) -> AppResult<Review> {
        let row = sqlx::query_as::<sqlx::Postgres, ReviewRow>(
            r#"
            UPDATE reviews
            SET rating = $2,
                comment = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, accommodation_id, user_id, rating, comment, created_at, updated_at
            "#,
        )
        .bind(review.id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating review {}: {}", review.id, e);
            AppError::Persistence(format!("Failed to update review: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(format!("Review {}", review.id)))?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting review {}: {}", id, e);
                AppError::Persistence(format!("Failed to delete review: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    accommodation_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = validate_rating(row.rating)
            .map_err(|e| AppError::Persistence(format!("review {}: {}", row.id, e)))?;

        Ok(Self {
            id: row.id,
            accommodation_id: row.accommodation_id,
            user_id: row.user_id,
            rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_rating_is_persistence_error() {
        let row = ReviewRow {
            id: Uuid::new_v4(),
            accommodation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: 7,
            comment: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        assert!(matches!(
            Review::try_from(row),
            Err(AppError::Persistence(_))
        ));
    }
}
