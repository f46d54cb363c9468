//! Accommodation catalog
//!
//! Public browsing (single listing, filtered listing, most popular) and the
//! administrator's listing and room maintenance. Rooms are addressed by
//! index, so a room is never removed from the list: "deleting" one closes
//! it to new bookings and every existing booking keeps its room.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use stayhub_core::{
    models::{Accommodation, AccommodationType, Booking, BookingStatus, GeoPoint, Principal, Room},
    traits::{
        AccommodationRepository, BookingRepository, PaginatedResponse, Pagination, UserRepository,
    },
    AppError, AppResult,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::search::SearchFilters;

/// Largest `limit` accepted by [`CatalogService::popular`]
pub const MAX_POPULAR: i64 = 50;

/// Ordering of the catalog listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    #[default]
    Rating,
    /// Cheapest room first (or last when descending)
    Price,
    Newest,
}

impl CatalogSort {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rating" => Some(CatalogSort::Rating),
            "price" => Some(CatalogSort::Price),
            "created_at" => Some(CatalogSort::Newest),
            _ => None,
        }
    }
}

/// Catalog listing query
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub filters: SearchFilters,
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    /// Case-insensitive substring of the country
    pub country: Option<String>,
    pub sort: CatalogSort,
    pub descending: bool,
}

impl CatalogQuery {
    fn matches(&self, accommodation: &Accommodation) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_deref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }

        self.filters.matches(accommodation)
            && contains(&accommodation.city, &self.city)
            && contains(&accommodation.country, &self.country)
    }

    fn order(&self, list: &mut [Accommodation]) {
        match self.sort {
            CatalogSort::Rating => {
                list.sort_by(|a, b| a.average_rating.total_cmp(&b.average_rating))
            }
            // Listings without rooms sort as the most expensive
            CatalogSort::Price => list.sort_by_key(|a| a.min_price().unwrap_or(Decimal::MAX)),
            CatalogSort::Newest => list.sort_by_key(|a| a.created_at),
        }
        if self.descending {
            list.reverse();
        }
    }
}

/// A listing as shown to a caller
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub accommodation: Accommodation,
    /// Present only for authenticated callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

/// Fields of a new listing
#[derive(Debug, Clone)]
pub struct NewAccommodation {
    pub name: String,
    pub description: Option<String>,
    pub accommodation_type: AccommodationType,
    pub location: Option<GeoPoint>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub amenities: Vec<String>,
    pub rooms: Vec<Room>,
    pub is_active: bool,
}

/// Listing fields an administrator may change; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct AccommodationChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub accommodation_type: Option<AccommodationType>,
    pub location: Option<GeoPoint>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl AccommodationChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.accommodation_type.is_none()
            && self.location.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.amenities.is_none()
            && self.is_active.is_none()
    }

    fn apply_to(self, acc: &mut Accommodation) {
        if let Some(v) = self.name {
            acc.name = v;
        }
        if let Some(v) = self.description {
            acc.description = Some(v);
        }
        if let Some(v) = self.accommodation_type {
            acc.accommodation_type = v;
        }
        if let Some(v) = self.location {
            acc.location = Some(v);
        }
        if let Some(v) = self.address {
            acc.address = v;
        }
        if let Some(v) = self.city {
            acc.city = v;
        }
        if let Some(v) = self.state {
            acc.state = Some(v);
        }
        if let Some(v) = self.country {
            acc.country = v;
        }
        if let Some(v) = self.amenities {
            acc.amenities = v;
        }
        if let Some(v) = self.is_active {
            acc.is_active = v;
        }
    }
}

/// Room fields an administrator may change; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct RoomChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<Decimal>,
    pub capacity: Option<i32>,
    pub amenities: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

impl RoomChanges {
    fn apply_to(self, room: &mut Room) {
        if let Some(v) = self.name {
            room.name = v;
        }
        if let Some(v) = self.description {
            room.description = Some(v);
        }
        if let Some(v) = self.price_per_night {
            room.price_per_night = v;
        }
        if let Some(v) = self.capacity {
            room.capacity = v;
        }
        if let Some(v) = self.amenities {
            room.amenities = v;
        }
        if let Some(v) = self.is_available {
            room.is_available = v;
        }
    }
}

fn validate_room(room: &Room) -> AppResult<()> {
    if room.name.trim().is_empty() {
        return Err(AppError::Validation("room name must not be empty".to_string()));
    }
    if room.price_per_night <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "room {} must have a positive nightly price",
            room.name
        )));
    }
    if room.capacity < 1 {
        return Err(AppError::Validation(format!(
            "room {} must hold at least one guest",
            room.name
        )));
    }
    Ok(())
}

fn require_admin(principal: &Principal, action: &str) -> AppResult<()> {
    if !principal.is_admin {
        warn!("User {} attempted to {} without admin rights", principal.id, action);
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// Most-booked listing in the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct TopAccommodation {
    pub id: Uuid,
    pub name: String,
    pub total_bookings: i64,
}

/// Administrator dashboard figures
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_accommodations: i64,
    pub total_bookings: i64,
    pub total_confirmed_bookings: i64,
    pub total_pending_bookings: i64,
    /// Five newest bookings
    pub recent_bookings: Vec<Booking>,
    /// Five most-booked active listings
    pub top_accommodations: Vec<TopAccommodation>,
}

pub struct CatalogService {
    accommodations: Arc<dyn AccommodationRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
}

impl CatalogService {
    pub fn new(
        accommodations: Arc<dyn AccommodationRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            accommodations,
            bookings,
            users,
        }
    }

    /// A single listing; inactive ones are only visible to administrators
    #[instrument(skip(self, principal))]
    pub async fn get(&self, id: Uuid, principal: Option<&Principal>) -> AppResult<CatalogEntry> {
        let accommodation = match self.accommodations.find_by_id(id).await? {
            Some(acc) if acc.is_active || principal.map_or(false, |p| p.is_admin) => acc,
            _ => return Err(AppError::NotFound(format!("Accommodation {}", id))),
        };

        let mut entries = self.to_entries(vec![accommodation], principal).await?;
        entries
            .pop()
            .ok_or_else(|| AppError::Internal("listing lost while flagging favorites".to_string()))
    }

    /// Active listings matching `query`, paginated
    #[instrument(skip(self, query, principal))]
    pub async fn list(
        &self,
        query: &CatalogQuery,
        pagination: Pagination,
        principal: Option<&Principal>,
    ) -> AppResult<PaginatedResponse<CatalogEntry>> {
        let mut matching: Vec<Accommodation> = self
            .accommodations
            .find_active(query.filters.accommodation_type)
            .await?
            .into_iter()
            .filter(|acc| query.matches(acc))
            .collect();
        query.order(&mut matching);

        debug!("Catalog listing: {} match(es)", matching.len());

        let page = pagination.apply(matching);
        Ok(PaginatedResponse {
            data: self.to_entries(page.data, principal).await?,
            pagination: page.pagination,
        })
    }

    /// The `limit` most-booked active listings
    #[instrument(skip(self, principal))]
    pub async fn popular(
        &self,
        limit: i64,
        principal: Option<&Principal>,
    ) -> AppResult<Vec<CatalogEntry>> {
        if !(1..=MAX_POPULAR).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_POPULAR, limit
            )));
        }

        let list = self.accommodations.find_popular(limit).await?;
        self.to_entries(list, principal).await
    }

    /// Create a listing owned by the calling administrator
    #[instrument(skip(self, new, principal), fields(user_id = %principal.id))]
    pub async fn create(
        &self,
        new: NewAccommodation,
        principal: &Principal,
    ) -> AppResult<Accommodation> {
        require_admin(principal, "create an accommodation")?;
        for room in &new.rooms {
            validate_room(room)?;
        }

        let now = Utc::now();
        let accommodation = Accommodation {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            accommodation_type: new.accommodation_type,
            location: new.location,
            address: new.address,
            city: new.city,
            state: new.state,
            country: new.country,
            amenities: new.amenities,
            rooms: new.rooms,
            is_active: new.is_active,
            created_by: principal.id,
            total_bookings: 0,
            average_rating: 0.0,
            reviews_count: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self.accommodations.create(&accommodation).await?;
        info!("Accommodation {} created: {}", created.id, created.name);
        Ok(created)
    }

    /// Change listing fields
    ///
    /// Fails with `InvalidInput` when no field is given.
    #[instrument(skip(self, changes, principal), fields(user_id = %principal.id))]
    pub async fn update(
        &self,
        id: Uuid,
        changes: AccommodationChanges,
        principal: &Principal,
    ) -> AppResult<Accommodation> {
        require_admin(principal, "update an accommodation")?;
        if changes.is_empty() {
            return Err(AppError::InvalidInput("No valid fields to update".to_string()));
        }

        let mut accommodation = self.load(id).await?;
        changes.apply_to(&mut accommodation);

        let updated = self.accommodations.update(&accommodation).await?;
        info!("Accommodation {} updated", id);
        Ok(updated)
    }

    /// Append a room; its index is the previous room count
    #[instrument(skip(self, room, principal), fields(user_id = %principal.id))]
    pub async fn add_room(
        &self,
        id: Uuid,
        room: Room,
        principal: &Principal,
    ) -> AppResult<Accommodation> {
        require_admin(principal, "add a room")?;
        validate_room(&room)?;

        let mut accommodation = self.load(id).await?;
        accommodation.rooms.push(room);

        let updated = self.accommodations.update(&accommodation).await?;
        info!("Room {} added to accommodation {}", updated.rooms.len() - 1, id);
        Ok(updated)
    }

    #[instrument(skip(self, changes, principal), fields(user_id = %principal.id))]
    pub async fn update_room(
        &self,
        id: Uuid,
        room_index: i32,
        changes: RoomChanges,
        principal: &Principal,
    ) -> AppResult<Accommodation> {
        require_admin(principal, "update a room")?;

        let mut accommodation = self.load(id).await?;
        let room = Self::room_mut(&mut accommodation, room_index)?;
        changes.apply_to(room);
        validate_room(room)?;

        self.accommodations.update(&accommodation).await
    }

    /// Close a room to new bookings; its index stays taken
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn delete_room(
        &self,
        id: Uuid,
        room_index: i32,
        principal: &Principal,
    ) -> AppResult<Accommodation> {
        require_admin(principal, "delete a room")?;

        let mut accommodation = self.load(id).await?;
        let room = Self::room_mut(&mut accommodation, room_index)?;
        if !room.is_available {
            debug!("Room {} of {} already closed", room_index, id);
            return Ok(accommodation);
        }
        room.is_available = false;

        let updated = self.accommodations.update(&accommodation).await?;
        info!("Room {} of accommodation {} closed", room_index, id);
        Ok(updated)
    }

    /// Counts and leaders for the administrator dashboard
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn dashboard_stats(&self, principal: &Principal) -> AppResult<DashboardStats> {
        require_admin(principal, "read dashboard stats")?;

        let (recent_bookings, total_bookings) =
            self.bookings.list_filtered(None, None, 5, 0).await?;
        let (_, total_confirmed_bookings) = self
            .bookings
            .list_filtered(Some(BookingStatus::Confirmed), None, 1, 0)
            .await?;
        let (_, total_pending_bookings) = self
            .bookings
            .list_filtered(Some(BookingStatus::Pending), None, 1, 0)
            .await?;

        let top_accommodations = self
            .accommodations
            .find_popular(5)
            .await?
            .into_iter()
            .map(|acc| TopAccommodation {
                id: acc.id,
                name: acc.name,
                total_bookings: acc.total_bookings,
            })
            .collect();

        Ok(DashboardStats {
            total_users: self.users.count().await?,
            total_accommodations: self.accommodations.count().await?,
            total_bookings,
            total_confirmed_bookings,
            total_pending_bookings,
            recent_bookings,
            top_accommodations,
        })
    }

    async fn load(&self, id: Uuid) -> AppResult<Accommodation> {
        self.accommodations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Accommodation {}", id)))
    }

    fn room_mut(accommodation: &mut Accommodation, room_index: i32) -> AppResult<&mut Room> {
        let index = usize::try_from(room_index)
            .ok()
            .filter(|&i| i < accommodation.rooms.len());
        match index {
            Some(i) => Ok(&mut accommodation.rooms[i]),
            None => Err(AppError::NotFound(format!(
                "Room {} in accommodation {}",
                room_index, accommodation.id
            ))),
        }
    }

    async fn to_entries(
        &self,
        list: Vec<Accommodation>,
        principal: Option<&Principal>,
    ) -> AppResult<Vec<CatalogEntry>> {
        let favorites: Option<BTreeSet<Uuid>> = match principal {
            Some(p) => Some(
                self.users
                    .find_by_id(p.id)
                    .await?
                    .map(|u| u.favorites)
                    .unwrap_or_default(),
            ),
            None => None,
        };

        Ok(list
            .into_iter()
            .map(|accommodation| CatalogEntry {
                is_favorite: favorites
                    .as_ref()
                    .map(|favs| favs.contains(&accommodation.id)),
                accommodation,
            })
            .collect())
    }
}
