//! Service wiring shared by the HTTP handlers

use std::sync::Arc;

use actix_web::web;
use stayhub_core::traits::{
    AccommodationRepository, BookingRepository, Notifier, PaymentGateway, PaymentRepository,
    ReviewRepository, UserRepository,
};
use stayhub_services::{
    BookingManager, CatalogService, FavoritesService, PaymentReconciler, ReviewService,
    SearchService,
};

/// Storage backends the services run on
pub struct Repositories {
    /// Accommodation store
    pub accommodations: Arc<dyn AccommodationRepository>,
    /// Booking store
    pub bookings: Arc<dyn BookingRepository>,
    /// Payment store
    pub payments: Arc<dyn PaymentRepository>,
    /// Review store
    pub reviews: Arc<dyn ReviewRepository>,
    /// User profile and favorites store
    pub users: Arc<dyn UserRepository>,
}

/// Every service the routes depend on
#[derive(Clone)]
pub struct AppServices {
    /// Booking lifecycle
    pub bookings: web::Data<BookingManager>,
    /// Payment initiation and verification
    pub payments: web::Data<PaymentReconciler>,
    /// Review management
    pub reviews: web::Data<ReviewService>,
    /// Location search
    pub search: web::Data<SearchService>,
    /// Favorites
    pub favorites: web::Data<FavoritesService>,
    /// Listing browse and admin maintenance
    pub catalog: web::Data<CatalogService>,
    /// Account lookup for the auth extractors
    pub users: web::Data<Arc<dyn UserRepository>>,
}

impl AppServices {
    /// Wire the services over the given repositories and collaborators
    pub fn build(
        repos: Repositories,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        callback_url: Option<String>,
        default_search_radius_m: f64,
    ) -> Self {
        let manager = Arc::new(BookingManager::new(
            repos.accommodations.clone(),
            repos.bookings.clone(),
            repos.users.clone(),
            notifier,
        ));

        let payments = PaymentReconciler::new(
            repos.bookings.clone(),
            repos.payments,
            repos.accommodations.clone(),
            gateway,
            manager.clone(),
        )
        .with_callback_url(callback_url);

        let reviews = ReviewService::new(
            repos.reviews,
            repos.bookings.clone(),
            repos.accommodations.clone(),
        );

        let catalog = CatalogService::new(
            repos.accommodations.clone(),
            repos.bookings,
            repos.users.clone(),
        );

        let search = SearchService::new(repos.accommodations.clone(), repos.users.clone())
            .with_default_radius(default_search_radius_m);

        let favorites = FavoritesService::new(repos.users.clone(), repos.accommodations);

        Self {
            bookings: web::Data::from(manager),
            payments: web::Data::new(payments),
            reviews: web::Data::new(reviews),
            search: web::Data::new(search),
            favorites: web::Data::new(favorites),
            catalog: web::Data::new(catalog),
            users: web::Data::new(repos.users),
        }
    }

    /// Register every service as application data
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.bookings.clone())
            .app_data(self.payments.clone())
            .app_data(self.reviews.clone())
            .app_data(self.search.clone())
            .app_data(self.favorites.clone())
            .app_data(self.catalog.clone())
            .app_data(self.users.clone());
    }
}
