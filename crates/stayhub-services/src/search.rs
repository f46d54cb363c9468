//! Location search
//!
//! "Near me" radius search and bounding-box search over active
//! accommodations, with attribute filters, distance ordering and an
//! optional per-user favorite flag.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use stayhub_core::{
    models::{Accommodation, AccommodationType, GeoBounds, GeoPoint, Principal},
    traits::{AccommodationRepository, PaginatedResponse, Pagination, UserRepository},
    AppError, AppResult,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::proximity::{bounding_box_around, rank_by_distance};

/// Radius used when the caller gives none, in meters
pub const DEFAULT_RADIUS_M: f64 = 10_000.0;

/// Attribute filters shared by both searches
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub accommodation_type: Option<AccommodationType>,
    /// Matches when any room costs at least this much per night
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    /// Every listed amenity must be offered
    pub amenities: Vec<String>,
}

impl SearchFilters {
    pub fn matches(&self, accommodation: &Accommodation) -> bool {
        self.accommodation_type
            .map_or(true, |t| accommodation.accommodation_type == t)
            && self
                .min_rating
                .map_or(true, |r| accommodation.average_rating >= r)
            && accommodation.has_room_priced_within(self.min_price, self.max_price)
            && accommodation.has_amenities(&self.amenities)
    }
}

/// One search result
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub accommodation: Accommodation,
    /// Meters from the search origin
    #[serde(rename = "distance")]
    pub distance_m: Option<f64>,
    /// Present only for authenticated searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

pub struct SearchService {
    accommodations: Arc<dyn AccommodationRepository>,
    users: Arc<dyn UserRepository>,
    default_radius_m: f64,
}

impl SearchService {
    pub fn new(
        accommodations: Arc<dyn AccommodationRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            accommodations,
            users,
            default_radius_m: DEFAULT_RADIUS_M,
        }
    }

    pub fn with_default_radius(mut self, radius_m: f64) -> Self {
        self.default_radius_m = radius_m;
        self
    }

    /// Accommodations within `radius_m` of `origin`, nearest first
    #[instrument(skip(self, filters, principal))]
    pub async fn near_me(
        &self,
        origin: GeoPoint,
        radius_m: Option<f64>,
        filters: &SearchFilters,
        pagination: Pagination,
        principal: Option<&Principal>,
    ) -> AppResult<PaginatedResponse<SearchHit>> {
        let radius_m = radius_m.unwrap_or(self.default_radius_m);
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(AppError::Validation(format!(
                "distance must be a positive number of meters, got {}",
                radius_m
            )));
        }

        let candidates = self
            .accommodations
            .find_in_bounds(&bounding_box_around(&origin, radius_m))
            .await?
            .into_iter()
            .filter(|acc| filters.matches(acc))
            .collect();

        let ranked: Vec<_> = rank_by_distance(candidates, &origin, |acc| acc.location)
            .into_iter()
            .filter(|r| r.distance.map_or(false, |d| d <= radius_m))
            .collect();

        debug!(
            "near-me ({}, {}) r={}m: {} match(es)",
            origin.latitude,
            origin.longitude,
            radius_m,
            ranked.len()
        );

        let page = pagination.apply(ranked);
        self.to_hits(page, principal).await
    }

    /// Accommodations inside `bounds`, ordered by distance from its center
    #[instrument(skip(self, filters, principal))]
    pub async fn in_area(
        &self,
        bounds: GeoBounds,
        filters: &SearchFilters,
        pagination: Pagination,
        principal: Option<&Principal>,
    ) -> AppResult<PaginatedResponse<SearchHit>> {
        let candidates = self
            .accommodations
            .find_in_bounds(&bounds)
            .await?
            .into_iter()
            .filter(|acc| filters.matches(acc))
            .collect();

        let ranked = rank_by_distance(candidates, &bounds.center(), |acc| acc.location);
        let page = pagination.apply(ranked);
        self.to_hits(page, principal).await
    }

    async fn to_hits(
        &self,
        page: PaginatedResponse<crate::proximity::Ranked<Accommodation>>,
        principal: Option<&Principal>,
    ) -> AppResult<PaginatedResponse<SearchHit>> {
        let favorites = match principal {
            Some(p) => Some(self.favorites_of(p.id).await?),
            None => None,
        };

        let data = page
            .data
            .into_iter()
            .map(|ranked| SearchHit {
                is_favorite: favorites
                    .as_ref()
                    .map(|favs| favs.contains(&ranked.item.id)),
                accommodation: ranked.item,
                distance_m: ranked.distance,
            })
            .collect();

        Ok(PaginatedResponse {
            data,
            pagination: page.pagination,
        })
    }

    async fn favorites_of(&self, user_id: Uuid) -> AppResult<BTreeSet<Uuid>> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .map(|u| u.favorites)
            .unwrap_or_default())
    }
}
