//! User repository implementation
//!
//! Favorites live in `user_favorites`; adding is an idempotent insert and
//! removing a plain delete, so neither needs a read first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stayhub_core::{
    models::UserProfile,
    traits::{Repository, UserRepository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<UserProfile, Uuid> for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        debug!("Finding user by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.is_active, u.is_admin,
                   COALESCE(
                       ARRAY(SELECT f.accommodation_id FROM user_favorites f WHERE f.user_id = u.id),
                       '{}'
                   ) AS favorites,
                   u.created_at, u.updated_at
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user {}: {}", id, e);
            AppError::Persistence(format!("Failed to find user: {}", e))
        })?;

        Ok(row.map(UserProfile::from))
    }

    #[instrument(skip(self, entity), fields(email = %entity.email))]
    async fn create(&self, entity: &UserProfile) -> AppResult<UserProfile> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, is_active, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entity.id)
        .bind(&entity.email)
        .bind(&entity.first_name)
        .bind(&entity.last_name)
        .bind(entity.is_active)
        .bind(entity.is_admin)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating user: {}", e);
            if super::sqlstate(&e).as_deref() == Some(super::UNIQUE_VIOLATION) {
                AppError::AlreadyExists(format!("User {} already exists", entity.email))
            } else {
                AppError::Persistence(format!("Failed to create user: {}", e))
            }
        })?;

        for accommodation_id in &entity.favorites {
            self.add_favorite(entity.id, *accommodation_id).await?;
        }

        Ok(entity.clone())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn add_favorite(&self, user_id: Uuid, accommodation_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_favorites (user_id, accommodation_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(accommodation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error adding favorite for {}: {}", user_id, e);
            AppError::Persistence(format!("Failed to add favorite: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn remove_favorite(&self, user_id: Uuid, accommodation_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM user_favorites WHERE user_id = $1 AND accommodation_id = $2",
        )
        .bind(user_id)
        .bind(accommodation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error removing favorite for {}: {}", user_id, e);
            AppError::Persistence(format!("Failed to remove favorite: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting users: {}", e);
                AppError::Persistence(format!("Failed to count users: {}", e))
            })?;

        Ok(result.0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    is_active: bool,
    is_admin: bool,
    favorites: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            is_admin: row.is_admin,
            favorites: row.favorites.into_iter().collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
