//! Payment repository implementation

use super::{sqlstate, UNIQUE_VIOLATION};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use stayhub_core::{
    models::{Payment, PaymentMethod, PaymentStatus, Settlement},
    traits::{PaymentRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    id, booking_id, user_id, amount, payment_method, reference,
    authorization_url, access_code, status, provider_response,
    created_at, updated_at
"#;

/// PostgreSQL implementation of PaymentRepository
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Payment, Uuid> for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment {}: {}", id, e);
            AppError::Persistence(format!("Failed to find payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(reference = %entity.reference))]
    async fn create(&self, entity: &Payment) -> AppResult<Payment> {
        debug!("Recording payment for booking {}", entity.booking_id);

        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (
                id, booking_id, user_id, amount, payment_method, reference,
                authorization_url, access_code, status, provider_response,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(entity.id)
        .bind(entity.booking_id)
        .bind(entity.user_id)
        .bind(entity.amount)
        .bind(entity.payment_method.to_string())
        .bind(&entity.reference)
        .bind(&entity.authorization_url)
        .bind(&entity.access_code)
        .bind(entity.status.as_str())
        .bind(&entity.provider_response)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating payment: {}", e);
            if sqlstate(&e).as_deref() == Some(UNIQUE_VIOLATION) {
                AppError::AlreadyExists(format!("Payment reference {}", entity.reference))
            } else {
                AppError::Persistence(format!("Failed to create payment: {}", e))
            }
        })?;

        row.try_into()
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_by_reference(&self, reference: &str) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE reference = $1",
            SELECT_COLUMNS
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment {}: {}", reference, e);
            AppError::Persistence(format!("Failed to find payment: {}", e))
        })?;

        row.map(Payment::try_from).transpose()
    }

    #[instrument(skip(self, provider_response))]
    async fn settle(
        &self,
        reference: &str,
        status: PaymentStatus,
        provider_response: &serde_json::Value,
    ) -> AppResult<Option<Settlement>> {
        // Only payable records move, and only when the status actually changes
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET status = $2,
                provider_response = $3,
                updated_at = NOW()
            WHERE reference = $1
              AND status IN ('pending', 'failed')
              AND status <> $2
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(reference)
        .bind(status.as_str())
        .bind(provider_response)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error settling payment {}: {}", reference, e);
            AppError::Persistence(format!("Failed to settle payment: {}", e))
        })?;

        match row {
            Some(row) => {
                let payment = Payment::try_from(row)?;
                info!("Payment {} settled as {}", reference, payment.status);
                Ok(Some(Settlement::Transitioned(payment)))
            }
            None => Ok(self
                .find_by_reference(reference)
                .await?
                .map(Settlement::Unchanged)),
        }
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    payment_method: String,
    reference: String,
    authorization_url: Option<String>,
    access_code: Option<String>,
    status: String,
    provider_response: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::from_str(&row.payment_method).ok_or_else(|| {
            AppError::Persistence(format!(
                "payment {} has unknown method '{}'",
                row.reference, row.payment_method
            ))
        })?;
        let status = PaymentStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Persistence(format!(
                "payment {} has unknown status '{}'",
                row.reference, row.status
            ))
        })?;

        Ok(Self {
            id: row.id,
            booking_id: row.booking_id,
            user_id: row.user_id,
            amount: row.amount,
            payment_method,
            reference: row.reference,
            authorization_url: row.authorization_url,
            access_code: row.access_code,
            status,
            provider_response: row.provider_response,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
