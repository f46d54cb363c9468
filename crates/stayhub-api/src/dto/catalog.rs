//! Catalog DTOs
//!
//! Public listing queries and the administrator's listing and room requests.

use rust_decimal::Decimal;
use serde::Deserialize;
use stayhub_core::{
    models::{AccommodationType, GeoPoint, Room},
    traits::Pagination,
    AppError,
};
use stayhub_services::{
    AccommodationChanges, CatalogQuery, CatalogSort, NewAccommodation, RoomChanges,
};
use validator::Validate;

use super::accommodation::{parse_accommodation_type, FilterParams};
use super::common::{default_page, default_per_page, PaginationParams};

/// Query for `GET /accommodations`
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogListQuery {
    /// Type filter
    #[serde(rename = "type", alias = "accommodation_type")]
    pub accommodation_type: Option<String>,
    /// Case-insensitive part of the city
    pub city: Option<String>,
    /// Case-insensitive part of the country
    pub country: Option<String>,
    /// Lowest nightly price
    pub min_price: Option<Decimal>,
    /// Highest nightly price
    pub max_price: Option<Decimal>,
    /// Lowest average rating
    pub min_rating: Option<f64>,
    /// Comma-separated amenities
    pub amenities: Option<String>,
    /// rating, price or created_at
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_per_page", alias = "per_page")]
    pub limit: i64,
}

impl CatalogListQuery {
    /// Convert to the service-level query; rating, best first, by default
    pub fn to_query(&self) -> Result<CatalogQuery, AppError> {
        let filters = FilterParams {
            accommodation_type: self.accommodation_type.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            amenities: self.amenities.clone(),
        }
        .to_filters()?;

        let sort = match self.sort_by.as_deref() {
            None | Some("") => CatalogSort::default(),
            Some(s) => CatalogSort::from_str(s).ok_or_else(|| {
                AppError::Validation(format!(
                    "sort_by must be rating, price or created_at, got '{}'",
                    s
                ))
            })?,
        };

        let descending = match self.sort_order.as_deref() {
            None | Some("") | Some("desc") => true,
            Some("asc") => false,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "sort_order must be asc or desc, got '{}'",
                    other
                )))
            }
        };

        Ok(CatalogQuery {
            filters,
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            country: self.country.clone().filter(|c| !c.trim().is_empty()),
            sort,
            descending,
        })
    }

    /// Validated pagination
    pub fn pagination(&self) -> Result<Pagination, AppError> {
        PaginationParams {
            page: self.page,
            per_page: self.limit,
        }
        .to_pagination()
    }
}

fn default_popular_limit() -> i64 {
    10
}

/// Query for `GET /accommodations/popular`
#[derive(Debug, Clone, Deserialize)]
pub struct PopularQuery {
    /// How many listings to return, 1 to 50
    #[serde(default = "default_popular_limit")]
    pub limit: i64,
}

fn default_true() -> bool {
    true
}

/// Build an optional location from optional coordinates
fn location(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<GeoPoint>, AppError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).map(Some),
        (None, None) => Ok(None),
        _ => Err(AppError::Validation(
            "latitude and longitude must be given together".to_string(),
        )),
    }
}

/// A room in a create or add-room request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoomRequest {
    /// Display name
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// Free-form description
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// Nightly rate
    pub price_per_night: Decimal,

    /// Maximum number of guests
    #[validate(range(min = 1, message = "A room must hold at least one guest"))]
    pub capacity: i32,

    /// Room amenities
    #[serde(default)]
    pub amenities: Vec<String>,

    /// Open for booking
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl From<RoomRequest> for Room {
    fn from(req: RoomRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price_per_night: req.price_per_night,
            capacity: req.capacity,
            amenities: req.amenities,
            is_available: req.is_available,
        }
    }
}

/// Room update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    /// New name
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New description
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// New nightly rate
    pub price_per_night: Option<Decimal>,
    /// New capacity
    #[validate(range(min = 1, message = "A room must hold at least one guest"))]
    pub capacity: Option<i32>,
    /// New amenity list
    pub amenities: Option<Vec<String>>,
    /// Open or close the room
    pub is_available: Option<bool>,
}

impl From<UpdateRoomRequest> for RoomChanges {
    fn from(req: UpdateRoomRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price_per_night: req.price_per_night,
            capacity: req.capacity,
            amenities: req.amenities,
            is_available: req.is_available,
        }
    }
}

/// Listing creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAccommodationRequest {
    /// Display name
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Free-form description
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// hotel, apartment, hostel or lodge
    pub accommodation_type: String,
    /// Latitude, together with longitude
    pub latitude: Option<f64>,
    /// Longitude, together with latitude
    pub longitude: Option<f64>,
    /// Street address
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    /// City
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    /// State or region
    pub state: Option<String>,
    /// Country
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    /// Property-wide amenities
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Rooms, in index order
    #[serde(default)]
    #[validate(nested)]
    pub rooms: Vec<RoomRequest>,
    /// Visible and bookable
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreateAccommodationRequest {
    /// Convert to the service-level listing
    pub fn into_new(self) -> Result<NewAccommodation, AppError> {
        let accommodation_type = required_type(&self.accommodation_type)?;
        Ok(NewAccommodation {
            location: location(self.latitude, self.longitude)?,
            name: self.name,
            description: self.description,
            accommodation_type,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            amenities: self.amenities,
            rooms: self.rooms.into_iter().map(Room::from).collect(),
            is_active: self.is_active,
        })
    }
}

fn required_type(s: &str) -> Result<AccommodationType, AppError> {
    parse_accommodation_type(Some(s))?
        .ok_or_else(|| AppError::Validation("accommodation_type is required".to_string()))
}

/// Listing update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAccommodationRequest {
    /// New name
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New description
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// New type
    pub accommodation_type: Option<String>,
    /// New latitude, together with longitude
    pub latitude: Option<f64>,
    /// New longitude, together with latitude
    pub longitude: Option<f64>,
    /// New street address
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    /// New city
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    /// New state or region
    pub state: Option<String>,
    /// New country
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    /// New amenity list
    pub amenities: Option<Vec<String>>,
    /// Show or hide the listing
    pub is_active: Option<bool>,
}

impl UpdateAccommodationRequest {
    /// Convert to the service-level changes
    pub fn into_changes(self) -> Result<AccommodationChanges, AppError> {
        let accommodation_type = match self.accommodation_type.as_deref() {
            Some(s) => Some(required_type(s)?),
            None => None,
        };
        Ok(AccommodationChanges {
            location: location(self.latitude, self.longitude)?,
            name: self.name,
            description: self.description,
            accommodation_type,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            amenities: self.amenities,
            is_active: self.is_active,
        })
    }
}
