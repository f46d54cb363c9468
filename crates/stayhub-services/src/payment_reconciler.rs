//! Payment reconciler
//!
//! Opens provider checkouts for pending bookings and folds provider verdicts
//! back into payment and booking state. Verification is idempotent: the
//! payment row is settled with a conditional update that never leaves
//! `paid`, and only the caller that actually moved it runs the side effects.

use std::sync::Arc;

use serde_json::json;
use stayhub_core::{
    models::{
        Booking, BookingGuard, BookingPatch, BookingStatus, Payment, PaymentMethod,
        PaymentStatus, Principal, Settlement,
    },
    traits::{
        AccommodationRepository, AuthorizationRequest, BookingRepository, PaymentGateway,
        PaymentRepository,
    },
    AppError, AppResult,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::booking_manager::{BookingManager, Notice};

/// Result of opening a checkout
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub payment: Payment,
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

/// Result of a verification
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    pub payment: Payment,
    pub booking: Option<Booking>,
    /// Whether this call moved the payment to a new status
    pub transitioned: bool,
}

pub struct PaymentReconciler {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    accommodations: Arc<dyn AccommodationRepository>,
    gateway: Arc<dyn PaymentGateway>,
    manager: Arc<BookingManager>,
    callback_url: Option<String>,
}

impl PaymentReconciler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        accommodations: Arc<dyn AccommodationRepository>,
        gateway: Arc<dyn PaymentGateway>,
        manager: Arc<BookingManager>,
    ) -> Self {
        Self {
            bookings,
            payments,
            accommodations,
            gateway,
            manager,
            callback_url: None,
        }
    }

    /// Set the URL the provider redirects the guest to after checkout
    pub fn with_callback_url(mut self, callback_url: Option<String>) -> Self {
        self.callback_url = callback_url;
        self
    }

    /// Open a checkout for a booking
    ///
    /// `email` defaults to the principal's address. The booking status is not
    /// changed; only its pending payment reference is stamped.
    #[instrument(skip(self, email, principal), fields(user_id = %principal.id))]
    pub async fn initiate(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
        email: Option<String>,
        principal: &Principal,
    ) -> AppResult<PaymentInitiation> {
        let booking = match self.bookings.find_by_id(booking_id).await? {
            Some(b) if b.is_owned_by(principal.id) => b,
            _ => return Err(AppError::NotFound(format!("Booking {}", booking_id))),
        };

        if booking.payment_status == PaymentStatus::Paid {
            return Err(AppError::AlreadyPaid(booking_id.to_string()));
        }
        match booking.booking_status {
            BookingStatus::Cancelled => {
                return Err(AppError::BookingCancelled(booking_id.to_string()))
            }
            BookingStatus::Completed => {
                return Err(AppError::InvalidTransition {
                    from: BookingStatus::Completed,
                    action: "pay",
                })
            }
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        let accommodation_name = self
            .accommodations
            .find_by_id(booking.accommodation_id)
            .await?
            .map(|acc| acc.name)
            .unwrap_or_default();

        let request = AuthorizationRequest {
            email: email.unwrap_or_else(|| principal.email.clone()),
            amount: booking.total_price,
            callback_url: self.callback_url.clone(),
            metadata: json!({
                "booking_id": booking.id,
                "user_id": principal.id,
                "accommodation_id": booking.accommodation_id,
                "accommodation_name": accommodation_name,
            }),
        };

        let authorization = self.gateway.authorize(&request).await?;

        let payment = Payment::pending(
            booking.id,
            principal.id,
            booking.total_price,
            method,
            &authorization,
        );
        let payment = self.payments.create(&payment).await?;

        let stamp = BookingPatch {
            payment_reference: Some(payment.reference.clone()),
            ..BookingPatch::default()
        };
        let guard = BookingGuard::status_in(&BookingStatus::ACTIVE);
        if self.bookings.apply(booking.id, &guard, &stamp).await?.is_none() {
            warn!(
                "Booking {} changed while payment {} was opened",
                booking.id, payment.reference
            );
        }

        info!(
            "Payment {} initiated for booking {}: {}",
            payment.reference, booking.id, payment.amount
        );

        Ok(PaymentInitiation {
            authorization_url: authorization.authorization_url,
            access_code: authorization.access_code,
            reference: payment.reference.clone(),
            payment,
        })
    }

    /// Verify a payment with the provider and apply the verdict
    ///
    /// An already-paid payment is returned without contacting the provider.
    /// Provider errors are surfaced unchanged; calling again is safe.
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn verify(&self, reference: &str, principal: &Principal) -> AppResult<PaymentVerification> {
        let payment = match self.payments.find_by_reference(reference).await? {
            Some(p) if p.user_id == principal.id => p,
            _ => return Err(AppError::NotFound(format!("Payment {}", reference))),
        };

        if payment.status == PaymentStatus::Paid {
            let booking = self.repair_paid_booking(&payment).await?;
            return Ok(PaymentVerification {
                payment,
                booking,
                transitioned: false,
            });
        }

        let verification = self.gateway.verify(reference).await?;
        let status = verification.outcome.payment_status();

        let settlement = self
            .payments
            .settle(reference, status, &verification.raw)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {}", reference)))?;

        match settlement {
            Settlement::Transitioned(payment) if payment.status == PaymentStatus::Paid => {
                info!("Payment {} verified as paid", reference);
                let (booking, confirmed_here) =
                    self.manager.apply_payment(payment.booking_id).await?;
                // A concurrent repair that confirmed the booking sends the receipt
                if confirmed_here || booking.booking_status != BookingStatus::Confirmed {
                    self.manager
                        .dispatch(&booking, Notice::Receipt(&payment))
                        .await;
                }
                Ok(PaymentVerification {
                    payment,
                    booking: Some(booking),
                    transitioned: true,
                })
            }
            Settlement::Transitioned(payment) => {
                info!("Payment {} verified as {}", reference, payment.status);
                let booking = self.record_failure(payment.booking_id).await?;
                Ok(PaymentVerification {
                    payment,
                    booking,
                    transitioned: true,
                })
            }
            Settlement::Unchanged(payment) => {
                let booking = self.bookings.find_by_id(payment.booking_id).await?;
                Ok(PaymentVerification {
                    payment,
                    booking,
                    transitioned: false,
                })
            }
        }
    }

    /// Fetch a payment visible to the principal
    #[instrument(skip(self, principal))]
    pub async fn get_payment(&self, reference: &str, principal: &Principal) -> AppResult<Payment> {
        match self.payments.find_by_reference(reference).await? {
            Some(p) if principal.can_access(p.user_id) => Ok(p),
            _ => Err(AppError::NotFound(format!("Payment {}", reference))),
        }
    }

    /// Finish confirmation for a paid payment whose booking never caught up
    ///
    /// Covers a verification that settled the payment but failed before the
    /// booking was confirmed, whether or not the booking was already stamped
    /// paid. The receipt goes out if this call confirms the booking.
    async fn repair_paid_booking(&self, payment: &Payment) -> AppResult<Option<Booking>> {
        match self.bookings.find_by_id(payment.booking_id).await? {
            Some(booking)
                if booking.booking_status == BookingStatus::Pending
                    || booking.payment_status != PaymentStatus::Paid =>
            {
                warn!(
                    "Booking {} is {}/{} for settled payment {}; finishing confirmation",
                    booking.id, booking.booking_status, booking.payment_status, payment.reference
                );
                let (booking, confirmed_here) = self.manager.apply_payment(booking.id).await?;
                if confirmed_here {
                    self.manager
                        .dispatch(&booking, Notice::Receipt(payment))
                        .await;
                }
                Ok(Some(booking))
            }
            other => Ok(other),
        }
    }

    async fn record_failure(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let guard =
            BookingGuard::any().with_payment_in(&[PaymentStatus::Pending, PaymentStatus::Failed]);
        match self
            .bookings
            .apply(booking_id, &guard, &BookingPatch::payment(PaymentStatus::Failed))
            .await?
        {
            Some(booking) => Ok(Some(booking)),
            None => self.bookings.find_by_id(booking_id).await,
        }
    }
}
