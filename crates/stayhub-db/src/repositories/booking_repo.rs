//! Booking repository implementation
//!
//! Status changes go through [`PgBookingRepository::apply`], a single
//! conditional `UPDATE ... RETURNING` so concurrent writers never lose an
//! update. The `bookings` table also carries an exclusion constraint that
//! rejects overlapping active bookings on the same room.

use super::{sqlstate, EXCLUSION_VIOLATION};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use stayhub_core::{
    models::{Booking, BookingGuard, BookingPatch, BookingStatus, PaymentStatus},
    traits::{BookingRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    id, accommodation_id, room_index, user_id,
    check_in, check_out, guests, total_price,
    booking_status, payment_status, payment_reference, special_requests,
    created_at, updated_at
"#;

/// PostgreSQL implementation of BookingRepository
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn status_strings(statuses: &[BookingStatus]) -> Vec<String> {
        statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}

#[async_trait]
impl Repository<Booking, Uuid> for PgBookingRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        debug!("Finding booking by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding booking {}: {}", id, e);
            AppError::Persistence(format!("Failed to find booking: {}", e))
        })?;

        row.map(Booking::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(booking_id = %entity.id))]
    async fn create(&self, entity: &Booking) -> AppResult<Booking> {
        debug!(
            "Creating booking for accommodation {} room {}",
            entity.accommodation_id, entity.room_index
        );

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (
                id, accommodation_id, room_index, user_id,
                check_in, check_out, guests, total_price,
                booking_status, payment_status, payment_reference, special_requests,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(entity.id)
        .bind(entity.accommodation_id)
        .bind(entity.room_index)
        .bind(entity.user_id)
        .bind(entity.check_in)
        .bind(entity.check_out)
        .bind(entity.guests)
        .bind(entity.total_price)
        .bind(entity.booking_status.as_str())
        .bind(entity.payment_status.as_str())
        .bind(&entity.payment_reference)
        .bind(&entity.special_requests)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if sqlstate(&e).as_deref() == Some(EXCLUSION_VIOLATION) {
                warn!(
                    "Overlap constraint rejected booking on accommodation {} room {}",
                    entity.accommodation_id, entity.room_index
                );
                AppError::DateConflict {
                    conflicts: Vec::new(),
                }
            } else {
                error!("Database error creating booking: {}", e);
                AppError::Persistence(format!("Failed to create booking: {}", e))
            }
        })?;

        row.try_into()
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    #[instrument(skip(self, statuses))]
    async fn find_for_room(
        &self,
        accommodation_id: Uuid,
        room_index: i32,
        statuses: &[BookingStatus],
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE accommodation_id = $1
              AND room_index = $2
              AND booking_status = ANY($3)
            ORDER BY check_in
            "#,
            SELECT_COLUMNS
        ))
        .bind(accommodation_id)
        .bind(room_index)
        .bind(Self::status_strings(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading room bookings: {}", e);
            AppError::Persistence(format!("Failed to load room bookings: {}", e))
        })?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_by_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE user_id = $1
              AND ($2::text IS NULL OR booking_status = $2)
            ORDER BY created_at DESC
            "#,
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing bookings for user {}: {}", user_id, e);
            AppError::Persistence(format!("Failed to list bookings: {}", e))
        })?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        status: Option<BookingStatus>,
        accommodation_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        let status = status.map(|s| s.as_str());

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM bookings
            WHERE ($1::text IS NULL OR booking_status = $1)
              AND ($2::uuid IS NULL OR accommodation_id = $2)
            "#,
        )
        .bind(status)
        .bind(accommodation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting bookings: {}", e);
            AppError::Persistence(format!("Failed to count bookings: {}", e))
        })?;

        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE ($1::text IS NULL OR booking_status = $1)
              AND ($2::uuid IS NULL OR accommodation_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            SELECT_COLUMNS
        ))
        .bind(status)
        .bind(accommodation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing bookings: {}", e);
            AppError::Persistence(format!("Failed to list bookings: {}", e))
        })?;

        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((bookings, total.0))
    }

    #[instrument(skip(self, statuses))]
    async fn exists_for_user(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
        statuses: &[BookingStatus],
    ) -> AppResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE user_id = $1
                  AND accommodation_id = $2
                  AND booking_status = ANY($3)
            )
            "#,
        )
        .bind(user_id)
        .bind(accommodation_id)
        .bind(Self::status_strings(statuses))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking bookings of user {}: {}", user_id, e);
            AppError::Persistence(format!("Failed to check bookings: {}", e))
        })?;

        Ok(exists.0)
    }

    #[instrument(skip(self))]
    async fn list_checking_in(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE check_in = $1 AND booking_status = $2
            ORDER BY created_at
            "#,
            SELECT_COLUMNS
        ))
        .bind(date)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing check-ins for {}: {}", date, e);
            AppError::Persistence(format!("Failed to list check-ins: {}", e))
        })?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    #[instrument(skip(self, guard, patch))]
    async fn apply(
        &self,
        id: Uuid,
        guard: &BookingGuard,
        patch: &BookingPatch,
    ) -> AppResult<Option<Booking>> {
        debug!("Applying {:?} to booking {} under {:?}", patch, id, guard);

        let guard_status = Self::status_strings(&guard.booking_status);
        let guard_payment: Vec<String> = guard
            .payment_status
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET booking_status = COALESCE($4, booking_status),
                payment_status = COALESCE($5, payment_status),
                payment_reference = COALESCE($6, payment_reference),
                special_requests = CASE WHEN $7 THEN $8 ELSE special_requests END,
                updated_at = NOW()
            WHERE id = $1
              AND (cardinality($2::text[]) = 0 OR booking_status = ANY($2))
              AND (cardinality($3::text[]) = 0 OR payment_status = ANY($3))
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(id)
        .bind(guard_status)
        .bind(guard_payment)
        .bind(patch.booking_status.map(|s| s.as_str()))
        .bind(patch.payment_status.map(|s| s.as_str()))
        .bind(&patch.payment_reference)
        .bind(patch.special_requests.is_some())
        .bind(patch.special_requests.clone().flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if sqlstate(&e).as_deref() == Some(EXCLUSION_VIOLATION) {
                warn!("Overlap constraint rejected update of booking {}", id);
                AppError::DateConflict {
                    conflicts: Vec::new(),
                }
            } else {
                error!("Database error updating booking {}: {}", id, e);
                AppError::Persistence(format!("Failed to update booking: {}", e))
            }
        })?;

        row.map(Booking::try_from).transpose()
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    accommodation_id: Uuid,
    room_index: i32,
    user_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
    total_price: Decimal,
    booking_status: String,
    payment_status: String,
    payment_reference: Option<String>,
    special_requests: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let booking_status = BookingStatus::from_str(&row.booking_status).ok_or_else(|| {
            AppError::Persistence(format!(
                "booking {} has unknown status '{}'",
                row.id, row.booking_status
            ))
        })?;
        let payment_status = PaymentStatus::from_str(&row.payment_status).ok_or_else(|| {
            AppError::Persistence(format!(
                "booking {} has unknown payment status '{}'",
                row.id, row.payment_status
            ))
        })?;

        Ok(Self {
            id: row.id,
            accommodation_id: row.accommodation_id,
            room_index: row.room_index,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            total_price: row.total_price,
            booking_status,
            payment_status,
            payment_reference: row.payment_reference,
            special_requests: row.special_requests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
