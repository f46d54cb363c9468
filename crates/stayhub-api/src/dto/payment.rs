//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stayhub_core::models::{BookingStatus, Payment, PaymentMethod, PaymentStatus};
use stayhub_services::{PaymentInitiation, PaymentVerification};
use uuid::Uuid;
use validator::Validate;

/// Payment initiation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitializePaymentRequest {
    /// Booking to pay for
    pub booking_id: Uuid,

    /// Payment channel
    #[serde(default)]
    pub payment_method: PaymentMethod,

    /// Receipt address; defaults to the account email
    #[validate(email)]
    pub email: Option<String>,
}

/// Payment response
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    /// Payment ID
    pub id: Uuid,
    /// Booking ID
    pub booking_id: Uuid,
    /// Amount in major units
    pub amount: Decimal,
    /// Payment channel
    pub payment_method: PaymentMethod,
    /// Provider reference
    pub reference: String,
    /// Hosted checkout URL
    pub authorization_url: Option<String>,
    /// Payment status
    pub status: PaymentStatus,
    /// Created at
    pub created_at: DateTime<Utc>,
    /// Updated at
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            booking_id: p.booking_id,
            amount: p.amount,
            payment_method: p.payment_method,
            reference: p.reference,
            authorization_url: p.authorization_url,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Checkout handle returned by initiation
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitResponse {
    /// Provider reference
    pub reference: String,
    /// Hosted checkout URL
    pub authorization_url: String,
    /// Provider access code
    pub access_code: Option<String>,
    /// Stored payment record
    pub payment: PaymentResponse,
}

impl From<PaymentInitiation> for PaymentInitResponse {
    fn from(init: PaymentInitiation) -> Self {
        Self {
            reference: init.reference,
            authorization_url: init.authorization_url,
            access_code: init.access_code,
            payment: init.payment.into(),
        }
    }
}

/// Verification result
#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerifyResponse {
    /// Payment record after verification
    pub payment: PaymentResponse,
    /// Booking status after verification
    pub booking_status: Option<BookingStatus>,
    /// Booking payment status after verification
    pub booking_payment_status: Option<PaymentStatus>,
    /// Whether this call changed the payment
    pub transitioned: bool,
}

impl From<PaymentVerification> for PaymentVerifyResponse {
    fn from(v: PaymentVerification) -> Self {
        Self {
            booking_status: v.booking.as_ref().map(|b| b.booking_status),
            booking_payment_status: v.booking.as_ref().map(|b| b.payment_status),
            payment: v.payment.into(),
            transitioned: v.transitioned,
        }
    }
}
