//! Payment models
//!
//! A payment record is created when a guest initiates checkout for a
//! pending booking, and settled by provider verification.

use super::booking::PaymentStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment channel chosen by the guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    BankTransfer,
    Ussd,
    Qr,
    MobileMoney,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Ussd => write!(f, "ussd"),
            PaymentMethod::Qr => write!(f, "qr"),
            PaymentMethod::MobileMoney => write!(f, "mobile_money"),
        }
    }
}

impl PaymentMethod {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "card" => Some(PaymentMethod::Card),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "ussd" => Some(PaymentMethod::Ussd),
            "qr" => Some(PaymentMethod::Qr),
            "mobile_money" => Some(PaymentMethod::MobileMoney),
            _ => None,
        }
    }
}

/// Payment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,

    /// Amount in major currency units
    pub amount: Decimal,

    pub payment_method: PaymentMethod,

    /// Provider transaction reference, unique per payment
    pub reference: String,

    /// Hosted checkout URL returned at initiation
    pub authorization_url: Option<String>,
    pub access_code: Option<String>,

    pub status: PaymentStatus,

    /// Raw provider verification payload, kept for audit
    pub provider_response: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Create a pending payment from a gateway authorization
    pub fn pending(
        booking_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        payment_method: PaymentMethod,
        authorization: &PaymentAuthorization,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            user_id,
            amount,
            payment_method,
            reference: authorization.reference.clone(),
            authorization_url: Some(authorization.authorization_url.clone()),
            access_code: authorization.access_code.clone(),
            status: PaymentStatus::Pending,
            provider_response: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Handle returned by the payment gateway when a checkout is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub reference: String,
    pub authorization_url: String,
    pub access_code: Option<String>,
}

/// Provider verdict for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Success,
    Failure,
}

impl VerificationOutcome {
    /// Payment status recorded for this verdict
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            VerificationOutcome::Success => PaymentStatus::Paid,
            VerificationOutcome::Failure => PaymentStatus::Failed,
        }
    }
}

/// Result of a gateway verification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayVerification {
    pub outcome: VerificationOutcome,
    pub raw: serde_json::Value,
}

/// Outcome of writing a verification result to a payment record
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// The record moved to the new status; side effects should run
    Transitioned(Payment),
    /// The record was already paid; nothing changed
    Unchanged(Payment),
}

impl Settlement {
    pub fn payment(&self) -> &Payment {
        match self {
            Settlement::Transitioned(p) | Settlement::Unchanged(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            Settlement::Transitioned(p) | Settlement::Unchanged(p) => p,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Settlement::Transitioned(_))
    }
}
