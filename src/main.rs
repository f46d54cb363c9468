//! StayHub Backend Server
//!
//! Accommodation booking engine: bookings, Paystack payments, location
//! search, reviews and favorites over PostgreSQL.

use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use stayhub_api::{configure_api, AppServices, Repositories};
use stayhub_auth::JwtService;
use stayhub_core::traits::Notifier;
use stayhub_core::AppConfig;
use stayhub_db::{
    create_pool, PgAccommodationRepository, PgBookingRepository, PgPaymentRepository,
    PgReviewRepository, PgUserRepository,
};
use stayhub_services::{LogNotifier, PaystackGateway, SmtpNotifier};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` applies to the StayHub
/// crates. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "stayhub_backend={0},stayhub_api={0},stayhub_services={0},stayhub_db={0},stayhub_auth={0},actix_web=info,sqlx=warn",
            log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting StayHub Backend v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("failed to load configuration")?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database).await?;

    let repos = Repositories {
        accommodations: Arc::new(PgAccommodationRepository::new(pool.clone())),
        bookings: Arc::new(PgBookingRepository::new(pool.clone())),
        payments: Arc::new(PgPaymentRepository::new(pool.clone())),
        reviews: Arc::new(PgReviewRepository::new(pool.clone())),
        users: Arc::new(PgUserRepository::new(pool.clone())),
    };

    if config.paystack.secret_key.is_empty() {
        warn!("Paystack secret key is not set; payment initialization will fail");
    }
    let gateway = Arc::new(PaystackGateway::new(&config.paystack)?);

    let notifier: Arc<dyn Notifier> = if config.email.enabled {
        info!(
            "Email notifications via {}:{}",
            config.email.smtp_server, config.email.smtp_port
        );
        Arc::new(SmtpNotifier::new(&config.email)?)
    } else {
        info!("Email disabled; notifications are logged only");
        Arc::new(LogNotifier)
    };

    let services = AppServices::build(
        repos,
        gateway,
        notifier,
        config.paystack.callback_url.clone(),
        config.booking.default_search_radius_m,
    );

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_minutes * 60,
    ));
    info!(
        "JWT validation configured with {} minute token expiration",
        config.auth.jwt_expiration_minutes
    );

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                origin
                    .to_str()
                    .map(|o| cors_origins_inner.split(',').any(|allowed| allowed.trim() == o))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        let services = services.clone();

        App::new()
            .app_data(web::Data::new(jwt_service.clone()))
            .configure(move |cfg| services.register(cfg))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message,
                        "status": 400,
                    })),
                )
                .into()
            }))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_body",
                        "message": error_message,
                        "status": 400,
                    })),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_api)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
