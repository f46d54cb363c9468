//! HTTP request handlers

pub mod accommodations;
pub mod admin;
pub mod bookings;
pub mod favorites;
pub mod health;
pub mod payments;

pub use accommodations::configure as configure_accommodations;
pub use admin::configure as configure_admin;
pub use bookings::configure as configure_bookings;
pub use favorites::configure as configure_favorites;
pub use health::health_check;
pub use payments::configure as configure_payments;

use actix_web::web;

/// Mount every route under `/api/v1`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_bookings)
            .configure(configure_payments)
            .configure(configure_accommodations)
            .configure(configure_favorites)
            .configure(configure_admin),
    );
}
