//! HTTP-level tests against the in-memory store

use std::sync::Arc;

use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use stayhub_api::{configure_api, AppServices, Repositories};
use stayhub_auth::JwtService;
use stayhub_core::{
    models::{
        Accommodation, AccommodationType, GatewayVerification, GeoPoint, PaymentAuthorization,
        Room, UserProfile, VerificationOutcome,
    },
    traits::{AuthorizationRequest, PaymentGateway},
    AppResult,
};
use stayhub_db::MemoryStore;
use stayhub_services::LogNotifier;
use uuid::Uuid;

struct ApprovingGateway;

#[async_trait]
impl PaymentGateway for ApprovingGateway {
    async fn authorize(&self, _request: &AuthorizationRequest) -> AppResult<PaymentAuthorization> {
        let reference = format!("ACCOM-{}", &Uuid::new_v4().simple().to_string()[..10]).to_uppercase();
        Ok(PaymentAuthorization {
            authorization_url: format!("https://checkout.example/{}", reference),
            access_code: Some("code".to_string()),
            reference,
        })
    }

    async fn verify(&self, reference: &str) -> AppResult<GatewayVerification> {
        Ok(GatewayVerification {
            outcome: VerificationOutcome::Success,
            raw: json!({ "reference": reference, "status": "success" }),
        })
    }
}

struct TestContext {
    store: Arc<MemoryStore>,
    jwt: Arc<JwtService>,
    services: AppServices,
    accommodation: Accommodation,
}

impl TestContext {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let accommodation = Accommodation {
            id: Uuid::new_v4(),
            name: "Lekki Lodge".to_string(),
            description: None,
            accommodation_type: AccommodationType::Lodge,
            location: Some(GeoPoint::new(6.45, 3.43).unwrap()),
            address: "1 Admiralty Way".to_string(),
            city: "Lagos".to_string(),
            state: Some("Lagos".to_string()),
            country: "Nigeria".to_string(),
            amenities: vec!["wifi".to_string()],
            rooms: vec![Room {
                name: "Double".to_string(),
                description: None,
                price_per_night: dec!(100),
                capacity: 2,
                amenities: vec![],
                is_available: true,
            }],
            is_active: true,
            created_by: Uuid::new_v4(),
            total_bookings: 0,
            average_rating: 0.0,
            reviews_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.insert_accommodation(accommodation.clone());

        let repos = Repositories {
            accommodations: store.clone(),
            bookings: store.clone(),
            payments: store.clone(),
            reviews: store.clone(),
            users: store.clone(),
        };
        let services = AppServices::build(
            repos,
            Arc::new(ApprovingGateway),
            Arc::new(LogNotifier),
            None,
            10_000.0,
        );

        Self {
            store,
            jwt: Arc::new(JwtService::new("api-test-secret", 3600)),
            services,
            accommodation,
        }
    }

    /// Register a user and return a bearer header value
    fn login(&self, is_admin: bool) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let email = format!("{}@example.com", id.simple());
        self.store.insert_user(UserProfile {
            id,
            email: email.clone(),
            first_name: "Ada".to_string(),
            last_name: "Eze".to_string(),
            is_active: true,
            is_admin,
            favorites: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        let token = self
            .jwt
            .create_token_for_user(id, &email, is_admin)
            .unwrap();
        (id, format!("Bearer {}", token))
    }

    fn booking_body(&self, check_in: &str, check_out: &str) -> Value {
        json!({
            "accommodation_id": self.accommodation.id,
            "room_index": 0,
            "check_in": check_in,
            "check_out": check_out,
            "guests": 2
        })
    }
}

macro_rules! app {
    ($ctx:expr) => {{
        let services = $ctx.services.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.jwt.clone()))
                .configure(move |cfg| services.register(cfg))
                .configure(configure_api),
        )
        .await
    }};
}

#[actix_web::test]
async fn health_endpoint_reports_healthy() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn booking_requires_authentication() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(ctx.booking_body("2024-03-01", "2024-03-04"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn book_then_pay_confirms_booking() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", auth.clone()))
        .set_json(ctx.booking_body("2024-03-01", "2024-03-04"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let booking = &body["data"];
    assert_eq!(booking["nights"], 3);
    assert_eq!(booking["booking_status"], "pending");
    assert_eq!(
        booking["total_price"].as_str().unwrap().parse::<Decimal>().unwrap(),
        dec!(300)
    );
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/initialize")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "booking_id": booking_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let reference = body["data"]["reference"].as_str().unwrap().to_string();
    assert!(reference.starts_with("ACCOM-"));
    assert_eq!(body["data"]["payment"]["status"], "pending");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/payments/verify/{}", reference))
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["transitioned"], true);
    assert_eq!(body["data"]["booking_status"], "confirmed");
    assert_eq!(body["data"]["booking_payment_status"], "paid");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/payments/verify/{}", reference))
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["transitioned"], false);
    assert_eq!(body["data"]["booking_status"], "confirmed");

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/initialize")
        .insert_header(("Authorization", auth))
        .set_json(json!({ "booking_id": booking_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "already_paid");
}

#[actix_web::test]
async fn overlapping_booking_returns_conflicts() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, first) = ctx.login(false);
    let (_, second) = ctx.login(false);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", first))
        .set_json(ctx.booking_body("2024-03-01", "2024-03-04"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", second.clone()))
        .set_json(ctx.booking_body("2024-03-03", "2024-03-05"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "date_conflict");
    assert_eq!(body["details"]["conflicts"].as_array().unwrap().len(), 1);

    // Back-to-back stays share no night
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", second))
        .set_json(ctx.booking_body("2024-03-04", "2024-03-06"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);
}

#[actix_web::test]
async fn inverted_dates_are_rejected() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", auth))
        .set_json(ctx.booking_body("2024-03-04", "2024-03-04"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_date_range");
}

#[actix_web::test]
async fn inverted_dates_win_over_field_errors() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);

    let mut body = ctx.booking_body("2024-03-09", "2024-03-04");
    body["guests"] = json!(0);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", auth))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_date_range");
}

#[actix_web::test]
async fn cancel_is_owner_only_and_terminal() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, owner) = ctx.login(false);
    let (_, stranger) = ctx.login(false);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", owner.clone()))
        .set_json(ctx.booking_body("2024-05-01", "2024-05-02"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bookings/{}", id))
        .insert_header(("Authorization", stranger.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/bookings/{}/cancel", id))
        .insert_header(("Authorization", stranger))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/bookings/{}/cancel", id))
        .insert_header(("Authorization", owner.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["booking_status"], "cancelled");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/bookings/{}/cancel", id))
        .insert_header(("Authorization", owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_transition");
}

#[actix_web::test]
async fn admin_listing_requires_admin() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, guest) = ctx.login(false);
    let (_, admin) = ctx.login(true);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", guest.clone()))
        .set_json(ctx.booking_body("2024-06-01", "2024-06-03"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/bookings")
        .insert_header(("Authorization", guest))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/bookings?status=pending&page=1&per_page=5")
        .insert_header(("Authorization", admin.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/bookings?status=bogus")
        .insert_header(("Authorization", admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn near_me_ranks_and_flags_favorites() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);

    let uri = "/api/v1/accommodations/near-me?latitude=6.45&longitude=3.43&distance=5000";

    let req = test::TestRequest::get().uri(uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0]["distance"].as_f64().unwrap() < 1.0);
    assert!(hits[0].get("is_favorite").is_none());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/users/favorites/{}", ctx.accommodation.id))
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["is_favorite"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/favorites")
        .insert_header(("Authorization", auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations/near-me?latitude=6.45&longitude=3.43&amenities=wifi,pool")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn search_rejects_bad_coordinates() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations/near-me?latitude=95&longitude=3.43")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations/in-area?min_lat=7&min_lng=3&max_lat=6&max_lng=4")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations/in-area?min_lat=6&min_lng=3&max_lat=7&max_lng=4")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[actix_web::test]
async fn reviews_require_a_booking() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);
    let reviews_uri = format!("/api/v1/accommodations/{}/reviews", ctx.accommodation.id);

    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "rating": 4, "comment": "Quiet and clean" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", auth.clone()))
        .set_json(ctx.booking_body("2024-07-01", "2024-07-02"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "rating": 9 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::post()
        .uri(&reviews_uri)
        .insert_header(("Authorization", auth))
        .set_json(json!({ "rating": 4, "comment": "Quiet and clean" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get().uri(&reviews_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let stored = ctx.store.accommodation(ctx.accommodation.id).unwrap();
    assert_eq!(stored.reviews_count, 1);
    assert_eq!(stored.average_rating, 4.0);
}

#[actix_web::test]
async fn review_changes_require_matching_accommodation() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", auth.clone()))
        .set_json(ctx.booking_body("2024-08-01", "2024-08-03"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/accommodations/{}/reviews", ctx.accommodation.id))
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "rating": 3 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let review_id = body["data"]["id"].as_str().unwrap().to_string();

    let elsewhere = format!(
        "/api/v1/accommodations/{}/reviews/{}",
        Uuid::new_v4(),
        review_id
    );
    let req = test::TestRequest::put()
        .uri(&elsewhere)
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "rating": 5 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::delete()
        .uri(&elsewhere)
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::put()
        .uri(&format!(
            "/api/v1/accommodations/{}/reviews/{}",
            ctx.accommodation.id, review_id
        ))
        .insert_header(("Authorization", auth))
        .set_json(json!({ "rating": 5 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["rating"], 5);
    assert_eq!(
        ctx.store
            .accommodation(ctx.accommodation.id)
            .unwrap()
            .average_rating,
        5.0
    );
}

#[actix_web::test]
async fn catalog_lists_details_and_popular() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, auth) = ctx.login(false);

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations?type=lodge&city=lag&amenities=WiFi")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Lekki Lodge");
    assert!(body["data"][0].get("is_favorite").is_none());

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations?type=hostel")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/accommodations/{}", ctx.accommodation.id))
        .insert_header(("Authorization", auth))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["rooms"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["is_favorite"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/accommodations/{}", Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations/popular?limit=3")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body["data"][0]["id"],
        ctx.accommodation.id.to_string().as_str()
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/accommodations/popular?limit=0")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn admin_manages_listings_rooms_and_stats() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (_, guest) = ctx.login(false);
    let (admin_id, admin) = ctx.login(true);

    let listing = json!({
        "name": "Ikoyi Suites",
        "accommodation_type": "apartment",
        "latitude": 6.45,
        "longitude": 3.43,
        "address": "4 Bourdillon Rd",
        "city": "Lagos",
        "country": "Nigeria",
        "rooms": [{ "name": "Studio", "price_per_night": "75", "capacity": 2 }]
    });

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/accommodations")
        .insert_header(("Authorization", guest.clone()))
        .set_json(listing.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/accommodations")
        .insert_header(("Authorization", admin.clone()))
        .set_json(listing)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["created_by"], admin_id.to_string().as_str());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/accommodations/{}/rooms", id))
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({ "name": "Penthouse", "price_per_night": "300", "capacity": 4 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["rooms"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/accommodations/{}/rooms/0", id))
        .insert_header(("Authorization", admin.clone()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["rooms"][0]["is_available"], false);
    assert_eq!(body["data"]["rooms"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", guest.clone()))
        .set_json(json!({
            "accommodation_id": id,
            "room_index": 0,
            "check_in": "2024-09-01",
            "check_out": "2024-09-03",
            "guests": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "room_unavailable");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/accommodations/{}", id))
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/accommodations/{}", id))
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({ "is_active": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["is_active"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/stats")
        .insert_header(("Authorization", guest))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/stats")
        .insert_header(("Authorization", admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_accommodations"], 2);
    assert_eq!(body["data"]["total_users"], 2);
    assert_eq!(body["data"]["total_bookings"], 0);
}

#[actix_web::test]
async fn deactivated_account_is_rejected_despite_valid_token() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (id, auth) = ctx.login(false);

    let mut user = ctx.store.user(id).unwrap();
    user.is_active = false;
    ctx.store.insert_user(user);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings")
        .insert_header(("Authorization", auth))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "forbidden");
}
