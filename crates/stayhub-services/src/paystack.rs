//! Paystack payment gateway adapter
//!
//! Implements [`PaymentGateway`] over Paystack's transaction API:
//!
//! - `POST {base}/transaction/initialize` opens a hosted checkout
//! - `GET {base}/transaction/verify/{reference}` fetches the verdict
//!
//! Both calls authenticate with the secret key as a Bearer token. Amounts
//! go over the wire in minor units (kobo). Every failure, including a
//! timeout or a `"status": false` envelope, surfaces as `PaymentProvider`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stayhub_core::{
    config::PaystackConfig,
    models::{GatewayVerification, PaymentAuthorization, VerificationOutcome},
    traits::{AuthorizationRequest, PaymentGateway},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::constants::{PAYMENT_REFERENCE_HEX_LEN, PAYMENT_REFERENCE_PREFIX};
use crate::pricing::to_minor_units;

/// Generate a fresh transaction reference, `ACCOM-` plus 10 uppercase hex digits
pub fn generate_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!(
        "{}{}",
        PAYMENT_REFERENCE_PREFIX,
        &hex[..PAYMENT_REFERENCE_HEX_LEN]
    )
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    currency: &'a str,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    metadata: &'a Value,
}

/// Common Paystack response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: Option<String>,
    reference: Option<String>,
}

/// Paystack gateway client
#[derive(Clone)]
pub struct PaystackGateway {
    client: Client,
    base_url: String,
    secret_key: String,
    currency: String,
    callback_url: Option<String>,
}

impl PaystackGateway {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &PaystackConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build Paystack client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            currency: config.currency.clone(),
            callback_url: config.callback_url.clone(),
        })
    }

    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        call: &str,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Paystack {} body read failed: {}", call, e);
            AppError::PaymentProvider(format!("{}: {}", call, e))
        })?;

        if !status.is_success() {
            error!("Paystack {} returned {}: {}", call, status, body);
            return Err(AppError::PaymentProvider(format!(
                "{} returned HTTP {}",
                call,
                status.as_u16()
            )));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            error!("Paystack {} sent unparseable body: {}", call, e);
            AppError::PaymentProvider(format!("{}: invalid response: {}", call, e))
        })?;

        if !envelope.status {
            return Err(AppError::PaymentProvider(format!(
                "{} rejected: {}",
                call, envelope.message
            )));
        }

        envelope
            .data
            .ok_or_else(|| AppError::PaymentProvider(format!("{} response has no data", call)))
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    async fn authorize(&self, request: &AuthorizationRequest) -> AppResult<PaymentAuthorization> {
        let reference = generate_reference();
        let callback_url = request
            .callback_url
            .as_deref()
            .or(self.callback_url.as_deref());

        let body = InitializeBody {
            email: &request.email,
            amount: to_minor_units(request.amount)?,
            currency: &self.currency,
            reference: &reference,
            callback_url,
            metadata: &request.metadata,
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Paystack initialize request failed: {}", e);
                AppError::PaymentProvider(format!("initialize: {}", e))
            })?;

        let data: InitializeData = Self::read_envelope(response, "initialize").await?;
        debug!("Paystack checkout opened for {}", reference);

        Ok(PaymentAuthorization {
            reference: data.reference.unwrap_or(reference),
            authorization_url: data.authorization_url,
            access_code: data.access_code,
        })
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> AppResult<GatewayVerification> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                error!("Paystack verify request failed: {}", e);
                AppError::PaymentProvider(format!("verify: {}", e))
            })?;

        let data: Value = Self::read_envelope(response, "verify").await?;

        let outcome = match data.get("status").and_then(Value::as_str) {
            Some("success") => VerificationOutcome::Success,
            _ => VerificationOutcome::Failure,
        };
        debug!("Paystack verdict for {}: {:?}", reference, outcome);

        Ok(GatewayVerification { outcome, raw: data })
    }
}
