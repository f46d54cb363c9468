//! Accommodation repository implementation
//!
//! Rooms are stored as a JSONB array so a room's id stays its index in the
//! list. Counters are only ever changed with single-statement updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use stayhub_core::{
    models::{Accommodation, AccommodationType, GeoBounds, GeoPoint, RatingSummary, Room},
    traits::{AccommodationRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    id, name, description, accommodation_type,
    latitude, longitude, address, city, state, country,
    amenities, rooms, is_active, created_by,
    total_bookings, average_rating, reviews_count,
    created_at, updated_at
"#;

/// PostgreSQL implementation of AccommodationRepository
pub struct PgAccommodationRepository {
    pool: PgPool,
}

impl PgAccommodationRepository {
    /// Create a new accommodation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Accommodation, Uuid> for PgAccommodationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Accommodation>> {
        debug!("Finding accommodation by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            "SELECT {} FROM accommodations WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding accommodation {}: {}", id, e);
            AppError::Persistence(format!("Failed to find accommodation: {}", e))
        })?;

        row.map(Accommodation::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(name = %entity.name))]
    async fn create(&self, entity: &Accommodation) -> AppResult<Accommodation> {
        debug!("Creating accommodation");

        let row = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            r#"
            INSERT INTO accommodations (
                id, name, description, accommodation_type,
                latitude, longitude, address, city, state, country,
                amenities, rooms, is_active, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(entity.id)
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(entity.accommodation_type.to_string())
        .bind(entity.location.map(|p| p.latitude))
        .bind(entity.location.map(|p| p.longitude))
        .bind(&entity.address)
        .bind(&entity.city)
        .bind(&entity.state)
        .bind(&entity.country)
        .bind(&entity.amenities)
        .bind(Json(&entity.rooms))
        .bind(entity.is_active)
        .bind(entity.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating accommodation: {}", e);
            AppError::Persistence(format!("Failed to create accommodation: {}", e))
        })?;

        row.try_into()
    }
}

#[async_trait]
impl AccommodationRepository for PgAccommodationRepository {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Accommodation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            "SELECT {} FROM accommodations WHERE id = ANY($1) ORDER BY name",
            SELECT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading accommodations: {}", e);
            AppError::Persistence(format!("Failed to load accommodations: {}", e))
        })?;

        rows.into_iter().map(Accommodation::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_in_bounds(&self, bounds: &GeoBounds) -> AppResult<Vec<Accommodation>> {
        debug!("Finding accommodations in bounds");

        let rows = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            r#"
            SELECT {}
            FROM accommodations
            WHERE is_active
              AND latitude BETWEEN $1 AND $3
              AND longitude BETWEEN $2 AND $4
            "#,
            SELECT_COLUMNS
        ))
        .bind(bounds.min_lat)
        .bind(bounds.min_lng)
        .bind(bounds.max_lat)
        .bind(bounds.max_lng)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error searching accommodations: {}", e);
            AppError::Persistence(format!("Failed to search accommodations: {}", e))
        })?;

        rows.into_iter().map(Accommodation::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        accommodation_type: Option<AccommodationType>,
    ) -> AppResult<Vec<Accommodation>> {
        let rows = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            r#"
            SELECT {}
            FROM accommodations
            WHERE is_active
              AND ($1::text IS NULL OR accommodation_type = $1)
            ORDER BY average_rating DESC, name
            "#,
            SELECT_COLUMNS
        ))
        .bind(accommodation_type.map(|t| t.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing accommodations: {}", e);
            AppError::Persistence(format!("Failed to list accommodations: {}", e))
        })?;

        rows.into_iter().map(Accommodation::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn find_popular(&self, limit: i64) -> AppResult<Vec<Accommodation>> {
        let rows = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            r#"
            SELECT {}
            FROM accommodations
            WHERE is_active
            ORDER BY total_bookings DESC, average_rating DESC, name
            LIMIT $1
            "#,
            SELECT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading popular accommodations: {}", e);
            AppError::Persistence(format!("Failed to load popular accommodations: {}", e))
        })?;

        rows.into_iter().map(Accommodation::try_from).collect()
    }

    #[instrument(skip(self, entity), fields(id = %entity.id))]
    async fn update(&self, entity: &Accommodation) -> AppResult<Accommodation> {
        debug!("Updating accommodation");

        let row = sqlx::query_as::<sqlx::Postgres, AccommodationRow>(&format!(
            r#"
            UPDATE accommodations
            SET name = $2,
                description = $3,
                accommodation_type = $4,
                latitude = $5,
                longitude = $6,
                address = $7,
                city = $8,
                state = $9,
                country = $10,
                amenities = $11,
                rooms = $12,
                is_active = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(entity.id)
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(entity.accommodation_type.to_string())
        .bind(entity.location.map(|p| p.latitude))
        .bind(entity.location.map(|p| p.longitude))
        .bind(&entity.address)
        .bind(&entity.city)
        .bind(&entity.state)
        .bind(&entity.country)
        .bind(&entity.amenities)
        .bind(Json(&entity.rooms))
        .bind(entity.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating accommodation {}: {}", entity.id, e);
            AppError::Persistence(format!("Failed to update accommodation: {}", e))
        })?;

        row.ok_or_else(|| AppError::NotFound(format!("Accommodation {}", entity.id)))?
            .try_into()
    }

    #[instrument(skip(self))]
    async fn increment_total_bookings(&self, id: Uuid, delta: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accommodations
            SET total_bookings = total_bookings + $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error incrementing bookings for {}: {}", id, e);
            AppError::Persistence(format!("Failed to increment total_bookings: {}", e))
        })?;

        if result.rows_affected() == 0 {
            warn!("Accommodation {} vanished before counter increment", id);
            return Err(AppError::NotFound(format!("Accommodation {}", id)));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accommodations
            SET average_rating = $2,
                reviews_count = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(summary.average_rating)
        .bind(summary.reviews_count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error writing rating for {}: {}", id, e);
            AppError::Persistence(format!("Failed to write rating summary: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Accommodation {}", id)));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accommodations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting accommodations: {}", e);
                AppError::Persistence(format!("Failed to count accommodations: {}", e))
            })?;

        Ok(result.0)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct AccommodationRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    accommodation_type: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: String,
    city: String,
    state: Option<String>,
    country: String,
    amenities: Vec<String>,
    rooms: Json<Vec<Room>>,
    is_active: bool,
    created_by: Uuid,
    total_bookings: i64,
    average_rating: f64,
    reviews_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccommodationRow> for Accommodation {
    type Error = AppError;

    fn try_from(row: AccommodationRow) -> Result<Self, Self::Error> {
        let accommodation_type =
            AccommodationType::from_str(&row.accommodation_type).ok_or_else(|| {
                AppError::Persistence(format!(
                    "accommodation {} has unknown type '{}'",
                    row.id, row.accommodation_type
                ))
            })?;

        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng).map_err(|e| {
                AppError::Persistence(format!("accommodation {} location: {}", row.id, e))
            })?),
            (None, None) => None,
            _ => {
                return Err(AppError::Persistence(format!(
                    "accommodation {} has a partial location",
                    row.id
                )))
            }
        };

        if row.total_bookings < 0 || row.reviews_count < 0 {
            return Err(AppError::Persistence(format!(
                "accommodation {} has negative counters",
                row.id
            )));
        }

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            accommodation_type,
            location,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            amenities: row.amenities,
            rooms: row.rooms.0,
            is_active: row.is_active,
            created_by: row.created_by,
            total_bookings: row.total_bookings,
            average_rating: row.average_rating,
            reviews_count: row.reviews_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
