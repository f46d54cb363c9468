//! In-memory store
//!
//! Implements every repository trait over a single `parking_lot::RwLock`, so
//! each trait call is atomic just like a single SQL statement. It mirrors the
//! PostgreSQL constraints that matter to the services: unique payment
//! references, one review per user and accommodation, and no overlapping
//! active bookings on a room.
//!
//! Used by the service and API tests and for running without a database.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use stayhub_core::{
    models::{
        Accommodation, AccommodationType, Booking, BookingConflict, BookingGuard, BookingPatch,
        BookingStatus, GeoBounds, Payment, PaymentStatus, RatingSummary, Review, Settlement,
        UserProfile,
    },
    traits::{
        AccommodationRepository, BookingRepository, PaymentRepository, Repository,
        ReviewRepository, UserRepository,
    },
    AppError, AppResult,
};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    accommodations: HashMap<Uuid, Accommodation>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, Payment>,
    reviews: HashMap<Uuid, Review>,
    users: HashMap<Uuid, UserProfile>,
}

/// Thread-safe in-memory implementation of all repositories
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Seeding ====================

    pub fn insert_accommodation(&self, accommodation: Accommodation) {
        self.tables
            .write()
            .accommodations
            .insert(accommodation.id, accommodation);
    }

    pub fn insert_user(&self, user: UserProfile) {
        self.tables.write().users.insert(user.id, user);
    }

    /// Insert a booking without the overlap check, as if two writers raced
    pub fn insert_booking(&self, booking: Booking) {
        self.tables.write().bookings.insert(booking.id, booking);
    }

    pub fn insert_payment(&self, payment: Payment) {
        self.tables.write().payments.insert(payment.id, payment);
    }

    // ==================== Inspection ====================

    pub fn accommodation(&self, id: Uuid) -> Option<Accommodation> {
        self.tables.read().accommodations.get(&id).cloned()
    }

    pub fn booking(&self, id: Uuid) -> Option<Booking> {
        self.tables.read().bookings.get(&id).cloned()
    }

    pub fn user(&self, id: Uuid) -> Option<UserProfile> {
        self.tables.read().users.get(&id).cloned()
    }

    pub fn payment_by_reference(&self, reference: &str) -> Option<Payment> {
        self.tables
            .read()
            .payments
            .values()
            .find(|p| p.reference == reference)
            .cloned()
    }

    pub fn payments_for_booking(&self, booking_id: Uuid) -> Vec<Payment> {
        self.tables
            .read()
            .payments
            .values()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect()
    }

    pub fn review(&self, id: Uuid) -> Option<Review> {
        self.tables.read().reviews.get(&id).cloned()
    }
}

fn newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

// ==================== Accommodations ====================

#[async_trait]
impl Repository<Accommodation, Uuid> for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Accommodation>> {
        Ok(self.accommodation(id))
    }

    async fn create(&self, entity: &Accommodation) -> AppResult<Accommodation> {
        let mut tables = self.tables.write();
        if tables.accommodations.contains_key(&entity.id) {
            return Err(AppError::AlreadyExists(format!(
                "Accommodation {}",
                entity.id
            )));
        }
        tables.accommodations.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl AccommodationRepository for MemoryStore {
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Accommodation>> {
        let tables = self.tables.read();
        let mut found: Vec<Accommodation> = ids
            .iter()
            .filter_map(|id| tables.accommodations.get(id).cloned())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn find_in_bounds(&self, bounds: &GeoBounds) -> AppResult<Vec<Accommodation>> {
        Ok(self
            .tables
            .read()
            .accommodations
            .values()
            .filter(|a| a.is_active)
            .filter(|a| a.location.map_or(false, |p| bounds.contains(&p)))
            .cloned()
            .collect())
    }

    async fn find_active(
        &self,
        accommodation_type: Option<AccommodationType>,
    ) -> AppResult<Vec<Accommodation>> {
        let mut found: Vec<Accommodation> = self
            .tables
            .read()
            .accommodations
            .values()
            .filter(|a| a.is_active)
            .filter(|a| accommodation_type.map_or(true, |t| a.accommodation_type == t))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(found)
    }

    async fn find_popular(&self, limit: i64) -> AppResult<Vec<Accommodation>> {
        let mut found: Vec<Accommodation> = self
            .tables
            .read()
            .accommodations
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.total_bookings
                .cmp(&a.total_bookings)
                .then_with(|| b.average_rating.total_cmp(&a.average_rating))
                .then_with(|| a.name.cmp(&b.name))
        });
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn update(&self, entity: &Accommodation) -> AppResult<Accommodation> {
        let mut tables = self.tables.write();
        let acc = tables
            .accommodations
            .get_mut(&entity.id)
            .ok_or_else(|| AppError::NotFound(format!("Accommodation {}", entity.id)))?;

        acc.name = entity.name.clone();
        acc.description = entity.description.clone();
        acc.accommodation_type = entity.accommodation_type;
        acc.location = entity.location;
        acc.address = entity.address.clone();
        acc.city = entity.city.clone();
        acc.state = entity.state.clone();
        acc.country = entity.country.clone();
        acc.amenities = entity.amenities.clone();
        acc.rooms = entity.rooms.clone();
        acc.is_active = entity.is_active;
        acc.updated_at = Utc::now();
        Ok(acc.clone())
    }

    async fn increment_total_bookings(&self, id: Uuid, delta: i64) -> AppResult<()> {
        let mut tables = self.tables.write();
        let acc = tables
            .accommodations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Accommodation {}", id)))?;
        acc.total_bookings += delta;
        acc.updated_at = Utc::now();
        Ok(())
    }

    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> AppResult<()> {
        let mut tables = self.tables.write();
        let acc = tables
            .accommodations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Accommodation {}", id)))?;
        acc.average_rating = summary.average_rating;
        acc.reviews_count = summary.reviews_count;
        acc.updated_at = Utc::now();
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().accommodations.len() as i64)
    }
}

// ==================== Bookings ====================

#[async_trait]
impl Repository<Booking, Uuid> for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.booking(id))
    }

    async fn create(&self, entity: &Booking) -> AppResult<Booking> {
        let mut tables = self.tables.write();

        if entity.booking_status.is_active() {
            let conflicts: Vec<BookingConflict> = tables
                .bookings
                .values()
                .filter(|b| {
                    b.accommodation_id == entity.accommodation_id
                        && b.room_index == entity.room_index
                        && b.booking_status.is_active()
                        && b.check_in < entity.check_out
                        && b.check_out > entity.check_in
                })
                .map(BookingConflict::from)
                .collect();

            if !conflicts.is_empty() {
                debug!(
                    "Rejecting booking {}: {} overlapping active booking(s)",
                    entity.id,
                    conflicts.len()
                );
                return Err(AppError::DateConflict { conflicts });
            }
        }

        tables.bookings.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn find_for_room(
        &self,
        accommodation_id: Uuid,
        room_index: i32,
        statuses: &[BookingStatus],
    ) -> AppResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .tables
            .read()
            .bookings
            .values()
            .filter(|b| {
                b.accommodation_id == accommodation_id
                    && b.room_index == room_index
                    && statuses.contains(&b.booking_status)
            })
            .cloned()
            .collect();
        found.sort_by_key(|b| b.check_in);
        Ok(found)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .tables
            .read()
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .filter(|b| status.map_or(true, |s| b.booking_status == s))
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn list_filtered(
        &self,
        status: Option<BookingStatus>,
        accommodation_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        let mut found: Vec<Booking> = self
            .tables
            .read()
            .bookings
            .values()
            .filter(|b| status.map_or(true, |s| b.booking_status == s))
            .filter(|b| accommodation_id.map_or(true, |id| b.accommodation_id == id))
            .cloned()
            .collect();
        newest_first(&mut found);

        let total = found.len() as i64;
        let page = found
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn exists_for_user(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
        statuses: &[BookingStatus],
    ) -> AppResult<bool> {
        Ok(self.tables.read().bookings.values().any(|b| {
            b.user_id == user_id
                && b.accommodation_id == accommodation_id
                && statuses.contains(&b.booking_status)
        }))
    }

    async fn list_checking_in(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .tables
            .read()
            .bookings
            .values()
            .filter(|b| b.check_in == date && b.booking_status == status)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.created_at);
        Ok(found)
    }

    async fn apply(
        &self,
        id: Uuid,
        guard: &BookingGuard,
        patch: &BookingPatch,
    ) -> AppResult<Option<Booking>> {
        let mut tables = self.tables.write();
        match tables.bookings.get_mut(&id) {
            Some(booking) if guard.matches(booking) => {
                patch.apply_to(booking);
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }
}

// ==================== Payments ====================

#[async_trait]
impl Repository<Payment, Uuid> for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self.tables.read().payments.get(&id).cloned())
    }

    async fn create(&self, entity: &Payment) -> AppResult<Payment> {
        let mut tables = self.tables.write();
        if tables
            .payments
            .values()
            .any(|p| p.reference == entity.reference)
        {
            return Err(AppError::AlreadyExists(format!(
                "Payment reference {}",
                entity.reference
            )));
        }
        tables.payments.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_by_reference(&self, reference: &str) -> AppResult<Option<Payment>> {
        Ok(self.payment_by_reference(reference))
    }

    async fn settle(
        &self,
        reference: &str,
        status: PaymentStatus,
        provider_response: &serde_json::Value,
    ) -> AppResult<Option<Settlement>> {
        let mut tables = self.tables.write();
        let payment = match tables
            .payments
            .values_mut()
            .find(|p| p.reference == reference)
        {
            Some(payment) => payment,
            None => return Ok(None),
        };

        if !payment.status.is_payable() || payment.status == status {
            return Ok(Some(Settlement::Unchanged(payment.clone())));
        }

        payment.status = status;
        payment.provider_response = Some(provider_response.clone());
        payment.updated_at = Utc::now();
        Ok(Some(Settlement::Transitioned(payment.clone())))
    }
}

// ==================== Reviews ====================

#[async_trait]
impl Repository<Review, Uuid> for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        Ok(self.tables.read().reviews.get(&id).cloned())
    }

    async fn create(&self, entity: &Review) -> AppResult<Review> {
        let mut tables = self.tables.write();
        if tables.reviews.values().any(|r| {
            r.user_id == entity.user_id && r.accommodation_id == entity.accommodation_id
        }) {
            return Err(AppError::AlreadyExists(
                "You have already reviewed this accommodation".to_string(),
            ));
        }
        tables.reviews.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn find_by_user_and_accommodation(
        &self,
        user_id: Uuid,
        accommodation_id: Uuid,
    ) -> AppResult<Option<Review>> {
        Ok(self
            .tables
            .read()
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.accommodation_id == accommodation_id)
            .cloned())
    }

    async fn list_for_accommodation(&self, accommodation_id: Uuid) -> AppResult<Vec<Review>> {
        let mut found: Vec<Review> = self
            .tables
            .read()
            .reviews
            .values()
            .filter(|r| r.accommodation_id == accommodation_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update(&self, review: &Review) -> AppResult<Review> {
        let mut tables = self.tables.write();
        let stored = tables
            .reviews
            .get_mut(&review.id)
            .ok_or_else(|| AppError::NotFound(format!("Review {}", review.id)))?;
        stored.rating = review.rating;
        stored.comment = review.comment.clone();
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().reviews.remove(&id).is_some())
    }
}

// ==================== Users ====================

#[async_trait]
impl Repository<UserProfile, Uuid> for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.user(id))
    }

    async fn create(&self, entity: &UserProfile) -> AppResult<UserProfile> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == entity.email) {
            return Err(AppError::AlreadyExists(format!(
                "User {} already exists",
                entity.email
            )));
        }
        tables.users.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn add_favorite(&self, user_id: Uuid, accommodation_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        Ok(user.favorites.insert(accommodation_id))
    }

    async fn remove_favorite(&self, user_id: Uuid, accommodation_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        Ok(user.favorites.remove(&accommodation_id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().users.len() as i64)
    }
}
