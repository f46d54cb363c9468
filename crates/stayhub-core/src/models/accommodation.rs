//! Accommodation and room models

use crate::error::AppError;
use crate::AppResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationType {
    #[default]
    Hotel,
    Apartment,
    Hostel,
    Lodge,
}

impl fmt::Display for AccommodationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccommodationType::Hotel => write!(f, "hotel"),
            AccommodationType::Apartment => write!(f, "apartment"),
            AccommodationType::Hostel => write!(f, "hostel"),
            AccommodationType::Lodge => write!(f, "lodge"),
        }
    }
}

impl AccommodationType {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hotel" => Some(AccommodationType::Hotel),
            "apartment" => Some(AccommodationType::Apartment),
            "hostel" => Some(AccommodationType::Hostel),
            "lodge" => Some(AccommodationType::Lodge),
            _ => None,
        }
    }
}

/// WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting out-of-range or non-finite coordinates
    pub fn new(latitude: f64, longitude: f64) -> AppResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::Validation(format!(
                "latitude {} out of range [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::Validation(format!(
                "longitude {} out of range [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Latitude/longitude box, inclusive on all edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Build a box from its bottom-left and top-right corners
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> AppResult<Self> {
        GeoPoint::new(min_lat, min_lng)?;
        GeoPoint::new(max_lat, max_lng)?;
        if min_lat > max_lat || min_lng > max_lng {
            return Err(AppError::Validation(format!(
                "bounding box corners reversed: ({}, {}) .. ({}, {})",
                min_lat, min_lng, max_lat, max_lng
            )));
        }
        Ok(Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        })
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lng..=self.max_lng).contains(&point.longitude)
    }

    /// Midpoint of the box in degree space
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude: (self.min_lat + self.max_lat) / 2.0,
            longitude: (self.min_lng + self.max_lng) / 2.0,
        }
    }
}

/// A bookable room inside an accommodation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Nightly rate in the accommodation's currency
    pub price_per_night: Decimal,

    /// Maximum number of guests
    pub capacity: i32,

    #[serde(default)]
    pub amenities: Vec<String>,

    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Accommodation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub accommodation_type: AccommodationType,

    /// Coordinates, when the property has been geocoded
    pub location: Option<GeoPoint>,

    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,

    /// Property-wide amenities
    pub amenities: Vec<String>,

    /// Rooms; a room's id is its index in this list
    pub rooms: Vec<Room>,

    pub is_active: bool,

    /// Administrator who owns the listing
    pub created_by: Uuid,

    /// Number of bookings ever created, incremented atomically
    pub total_bookings: i64,

    /// Mean review rating, 0 when there are no reviews
    pub average_rating: f64,

    pub reviews_count: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Accommodation {
    /// Resolve a room by its index
    pub fn room(&self, index: i32) -> Option<&Room> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.rooms.get(i))
    }

    /// Cheapest nightly rate across rooms
    pub fn min_price(&self) -> Option<Decimal> {
        self.rooms.iter().map(|r| r.price_per_night).min()
    }

    /// Most expensive nightly rate across rooms
    pub fn max_price(&self) -> Option<Decimal> {
        self.rooms.iter().map(|r| r.price_per_night).max()
    }

    /// Check whether any room's nightly rate lies within the given bounds
    pub fn has_room_priced_within(&self, min: Option<Decimal>, max: Option<Decimal>) -> bool {
        self.rooms.iter().any(|room| {
            min.map_or(true, |m| room.price_per_night >= m)
                && max.map_or(true, |m| room.price_per_night <= m)
        })
    }

    /// Check whether the property offers every amenity in `wanted`
    pub fn has_amenities(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|w| {
            self.amenities
                .iter()
                .any(|a| a.eq_ignore_ascii_case(w))
        })
    }
}
