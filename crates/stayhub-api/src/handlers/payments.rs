//! Payment handlers
//!
//! Checkout initiation and provider verification for bookings.

use crate::dto::common::validated;
use crate::dto::payment::{
    InitializePaymentRequest, PaymentInitResponse, PaymentResponse, PaymentVerifyResponse,
};
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use stayhub_auth::AuthenticatedUser;
use stayhub_core::AppError;
use stayhub_services::PaymentReconciler;
use tracing::{info, instrument};

/// Start a checkout for a pending booking
///
/// POST /api/v1/payments/initialize
#[instrument(skip(reconciler, user, req), fields(user_id = %user.id))]
pub async fn initialize_payment(
    reconciler: web::Data<PaymentReconciler>,
    user: AuthenticatedUser,
    req: web::Json<InitializePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Payment initialization")?;

    let req = req.into_inner();
    let init = reconciler
        .initiate(req.booking_id, req.payment_method, req.email, &user)
        .await?;

    info!(
        booking_id = %req.booking_id,
        reference = %init.reference,
        "Payment initialized"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        PaymentInitResponse::from(init),
        "Payment initialized",
    )))
}

/// Verify a payment with the provider and settle the booking
///
/// GET /api/v1/payments/verify/{reference}
#[instrument(skip(reconciler, user), fields(user_id = %user.id))]
pub async fn verify_payment(
    reconciler: web::Data<PaymentReconciler>,
    path: web::Path<String>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let verification = reconciler.verify(&path, &user).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PaymentVerifyResponse::from(
        verification,
    ))))
}

/// Get a payment by reference
///
/// GET /api/v1/payments/{reference}
#[instrument(skip(reconciler, user))]
pub async fn get_payment(
    reconciler: web::Data<PaymentReconciler>,
    path: web::Path<String>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let payment = reconciler.get_payment(&path, &user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(PaymentResponse::from(payment))))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/initialize", web::post().to(initialize_payment))
            .route("/verify/{reference}", web::get().to(verify_payment))
            .route("/{reference}", web::get().to(get_payment)),
    );
}
