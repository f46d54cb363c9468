//! Fixtures and recording fakes for service tests

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use stayhub_core::{
    models::{
        Accommodation, AccommodationType, Booking, GatewayVerification, GeoPoint, Payment,
        PaymentAuthorization, Principal, Room, UserProfile, VerificationOutcome,
    },
    traits::{AuthorizationRequest, Notifier, PaymentGateway},
    AppError, AppResult,
};
use stayhub_db::MemoryStore;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

pub fn room(price: Decimal, capacity: i32) -> Room {
    Room {
        name: format!("Room at {}", price),
        description: None,
        price_per_night: price,
        capacity,
        amenities: vec![],
        is_available: true,
    }
}

pub fn accommodation(name: &str, location: Option<(f64, f64)>) -> Accommodation {
    Accommodation {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        accommodation_type: AccommodationType::Hotel,
        location: location.map(|(lat, lng)| GeoPoint::new(lat, lng).unwrap()),
        address: "1 Test Street".to_string(),
        city: "Lagos".to_string(),
        state: None,
        country: "Nigeria".to_string(),
        amenities: vec!["WiFi".to_string()],
        rooms: vec![room(dec!(100), 2), room(dec!(250), 4)],
        is_active: true,
        created_by: Uuid::new_v4(),
        total_bookings: 0,
        average_rating: 0.0,
        reviews_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn user(is_admin: bool) -> UserProfile {
    let id = Uuid::new_v4();
    UserProfile {
        id,
        email: format!("{}@example.com", id.simple()),
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        is_active: true,
        is_admin,
        favorites: BTreeSet::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn principal(user: &UserProfile) -> Principal {
    Principal {
        id: user.id,
        email: user.email.clone(),
        is_active: user.is_active,
        is_admin: user.is_admin,
    }
}

/// Seed a store with one accommodation, a guest and an admin
pub fn seeded() -> (Arc<MemoryStore>, Accommodation, UserProfile, UserProfile) {
    let store = Arc::new(MemoryStore::new());
    let acc = accommodation("Lagoon View", Some((6.45, 3.39)));
    let guest = user(false);
    let admin = user(true);
    store.insert_accommodation(acc.clone());
    store.insert_user(guest.clone());
    store.insert_user(admin.clone());
    (store, acc, guest, admin)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Created(Uuid),
    Receipt(String),
    AutoCancelled(Uuid),
    Reminder(Uuid),
}

/// Notifier that records every call, optionally failing all of them
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    fn record(&self, sent: Sent) -> AppResult<()> {
        self.sent.lock().push(sent);
        if self.fail {
            return Err(AppError::Notification("smtp down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_booking_created(
        &self,
        booking: &Booking,
        _accommodation: &Accommodation,
        _user: &UserProfile,
    ) -> AppResult<()> {
        self.record(Sent::Created(booking.id))
    }

    async fn notify_payment_receipt(
        &self,
        payment: &Payment,
        _booking: &Booking,
        _accommodation: &Accommodation,
        _user: &UserProfile,
    ) -> AppResult<()> {
        self.record(Sent::Receipt(payment.reference.clone()))
    }

    async fn notify_booking_auto_cancelled(
        &self,
        booking: &Booking,
        _accommodation: &Accommodation,
        _user: &UserProfile,
    ) -> AppResult<()> {
        self.record(Sent::AutoCancelled(booking.id))
    }

    async fn notify_booking_reminder(
        &self,
        booking: &Booking,
        _accommodation: &Accommodation,
        _user: &UserProfile,
    ) -> AppResult<()> {
        self.record(Sent::Reminder(booking.id))
    }
}

/// Gateway with scripted verification outcomes per reference
#[derive(Default)]
pub struct FakeGateway {
    counter: AtomicUsize,
    outcomes: Mutex<HashMap<String, VerificationOutcome>>,
    pub verify_calls: AtomicUsize,
    pub unavailable: Mutex<bool>,
    pub last_request: Mutex<Option<AuthorizationRequest>>,
}

impl FakeGateway {
    pub fn set_outcome(&self, reference: &str, outcome: VerificationOutcome) {
        self.outcomes.lock().insert(reference.to_string(), outcome);
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn authorize(&self, request: &AuthorizationRequest) -> AppResult<PaymentAuthorization> {
        if *self.unavailable.lock() {
            return Err(AppError::PaymentProvider("connection refused".to_string()));
        }
        *self.last_request.lock() = Some(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let reference = format!("ACCOM-{:010X}", n);
        Ok(PaymentAuthorization {
            authorization_url: format!("https://checkout.example/{}", reference),
            access_code: Some(format!("code-{}", n)),
            reference,
        })
    }

    async fn verify(&self, reference: &str) -> AppResult<GatewayVerification> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if *self.unavailable.lock() {
            return Err(AppError::PaymentProvider("timed out".to_string()));
        }
        let outcome = self
            .outcomes
            .lock()
            .get(reference)
            .copied()
            .unwrap_or(VerificationOutcome::Success);
        Ok(GatewayVerification {
            outcome,
            raw: json!({ "reference": reference, "status": format!("{:?}", outcome) }),
        })
    }
}
