//! Location search DTOs and the filters shared with the catalog listing

use rust_decimal::Decimal;
use serde::Deserialize;
use stayhub_core::{
    models::{AccommodationType, GeoBounds, GeoPoint},
    traits::Pagination,
    AppError,
};
use stayhub_services::SearchFilters;

use super::common::{default_page, default_per_page, PaginationParams};

/// Parse an optional accommodation type; blank means no filter
pub fn parse_accommodation_type(s: Option<&str>) -> Result<Option<AccommodationType>, AppError> {
    match s {
        None | Some("") => Ok(None),
        Some(s) => AccommodationType::from_str(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Unknown accommodation type '{}'", s))),
    }
}

/// Attribute filters accepted by both searches
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    /// hotel, apartment, hostel or lodge
    #[serde(rename = "type", alias = "accommodation_type")]
    pub accommodation_type: Option<String>,
    /// Lowest acceptable nightly price
    pub min_price: Option<Decimal>,
    /// Highest acceptable nightly price
    pub max_price: Option<Decimal>,
    /// Lowest acceptable average rating
    pub min_rating: Option<f64>,
    /// Comma-separated amenities, all required
    pub amenities: Option<String>,
}

impl FilterParams {
    /// Convert to the service-level filters
    pub fn to_filters(&self) -> Result<SearchFilters, AppError> {
        let accommodation_type = parse_accommodation_type(self.accommodation_type.as_deref())?;

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::Validation(
                    "min_price must not exceed max_price".to_string(),
                ));
            }
        }

        let amenities = self
            .amenities
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchFilters {
            accommodation_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            amenities,
        })
    }
}

/// Query for `GET /accommodations/near-me`
#[derive(Debug, Clone, Deserialize)]
pub struct NearMeQuery {
    /// Caller latitude
    pub latitude: f64,
    /// Caller longitude
    pub longitude: f64,
    /// Search radius in meters
    pub distance: Option<f64>,
    /// Type filter
    #[serde(rename = "type", alias = "accommodation_type")]
    pub accommodation_type: Option<String>,
    /// Lowest nightly price
    pub min_price: Option<Decimal>,
    /// Highest nightly price
    pub max_price: Option<Decimal>,
    /// Lowest average rating
    pub min_rating: Option<f64>,
    /// Comma-separated amenities
    pub amenities: Option<String>,
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_per_page", alias = "per_page")]
    pub limit: i64,
}

impl NearMeQuery {
    /// Validated search origin
    pub fn origin(&self) -> Result<GeoPoint, AppError> {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Attribute filters
    pub fn filters(&self) -> Result<SearchFilters, AppError> {
        FilterParams {
            accommodation_type: self.accommodation_type.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            amenities: self.amenities.clone(),
        }
        .to_filters()
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

/// Query for `GET /accommodations/in-area`
#[derive(Debug, Clone, Deserialize)]
pub struct InAreaQuery {
    /// South edge
    pub min_lat: f64,
    /// West edge
    pub min_lng: f64,
    /// North edge
    pub max_lat: f64,
    /// East edge
    pub max_lng: f64,
    /// Type filter
    #[serde(rename = "type", alias = "accommodation_type")]
    pub accommodation_type: Option<String>,
    /// Lowest nightly price
    pub min_price: Option<Decimal>,
    /// Highest nightly price
    pub max_price: Option<Decimal>,
    /// Lowest average rating
    pub min_rating: Option<f64>,
    /// Comma-separated amenities
    pub amenities: Option<String>,
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_per_page", alias = "per_page")]
    pub limit: i64,
}

impl InAreaQuery {
    /// Validated bounding box
    pub fn bounds(&self) -> Result<GeoBounds, AppError> {
        GeoBounds::new(self.min_lat, self.min_lng, self.max_lat, self.max_lng)
    }

    /// Attribute filters
    pub fn filters(&self) -> Result<SearchFilters, AppError> {
        FilterParams {
            accommodation_type: self.accommodation_type.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            amenities: self.amenities.clone(),
        }
        .to_filters()
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
