//! Proximity ranker
//!
//! Great-circle distances and distance ordering. Items without coordinates
//! rank after every located item.

use std::cmp::Ordering;

use stayhub_core::models::{GeoBounds, GeoPoint};

use crate::constants::EARTH_RADIUS_M;

/// Haversine distance between two points, in meters
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Smallest lat/lng box containing every point within `radius_m` of `center`
///
/// Used as a coarse storage prefilter; callers still apply the exact
/// distance test. Near the poles or across the antimeridian the box widens
/// to the full longitude range.
pub fn bounding_box_around(center: &GeoPoint, radius_m: f64) -> GeoBounds {
    let radius_m = radius_m.max(0.0);
    let dlat = (radius_m / EARTH_RADIUS_M).to_degrees();

    let min_lat = (center.latitude - dlat).max(-90.0);
    let max_lat = (center.latitude + dlat).min(90.0);

    let cos_lat = center.latitude.to_radians().cos();
    let full_width = min_lat <= -90.0 || max_lat >= 90.0 || cos_lat <= f64::EPSILON;
    let dlng = if full_width { 180.0 } else { dlat / cos_lat };

    let (min_lng, max_lng) = if center.longitude - dlng < -180.0 || center.longitude + dlng > 180.0
    {
        (-180.0, 180.0)
    } else {
        (center.longitude - dlng, center.longitude + dlng)
    };

    GeoBounds {
        min_lat,
        min_lng,
        max_lat,
        max_lng,
    }
}

/// An item paired with its distance from the ranking origin
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    /// `None` when the item has no coordinates
    pub distance: Option<f64>,
}

/// Sort items nearest first, keeping input order among equals
pub fn rank_by_distance<T, F>(items: Vec<T>, origin: &GeoPoint, location: F) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> Option<GeoPoint>,
{
    let mut ranked: Vec<Ranked<T>> = items
        .into_iter()
        .map(|item| {
            let distance = location(&item).map(|p| haversine_distance(origin, &p));
            Ranked { item, distance }
        })
        .collect();

    ranked.sort_by(|a, b| compare_distance(a.distance, b.distance));
    ranked
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_distance(&point(0.0, 0.0), &point(0.0, 0.0)), 0.0);
        assert_eq!(
            haversine_distance(&point(6.45, 3.39), &point(6.45, 3.39)),
            0.0
        );
    }

    #[test]
    fn test_quarter_great_circle() {
        let d = haversine_distance(&point(0.0, 0.0), &point(0.0, 90.0));
        assert!((d - 10_007_543.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let lagos = point(6.5244, 3.3792);
        let abuja = point(9.0765, 7.3986);
        let there = haversine_distance(&lagos, &abuja);
        let back = haversine_distance(&abuja, &lagos);
        assert!((there - back).abs() < 1e-6);
        // Roughly 525 km
        assert!((500_000.0..550_000.0).contains(&there));
    }

    #[test]
    fn test_rank_puts_unlocated_last_and_is_stable() {
        let origin = point(0.0, 0.0);
        let items = vec![
            ("nowhere-1", None),
            ("far", Some(point(0.0, 10.0))),
            ("near", Some(point(0.0, 1.0))),
            ("nowhere-2", None),
        ];

        let ranked = rank_by_distance(items, &origin, |(_, p)| *p);
        let names: Vec<&str> = ranked.iter().map(|r| r.item.0).collect();
        assert_eq!(names, vec!["near", "far", "nowhere-1", "nowhere-2"]);
        assert!(ranked[2].distance.is_none());
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center = point(6.45, 3.39);
        let radius = 5_000.0;
        let bounds = bounding_box_around(&center, radius);

        // Points just inside the radius in each cardinal direction
        let dlat = (radius * 0.99 / EARTH_RADIUS_M).to_degrees();
        let dlng = dlat / center.latitude.to_radians().cos();
        for p in [
            point(center.latitude + dlat, center.longitude),
            point(center.latitude - dlat, center.longitude),
            point(center.latitude, center.longitude + dlng),
            point(center.latitude, center.longitude - dlng),
        ] {
            assert!(haversine_distance(&center, &p) < radius);
            assert!(bounds.contains(&p));
        }
    }

    #[test]
    fn test_bounding_box_near_pole_and_antimeridian() {
        let polar = bounding_box_around(&point(89.99, 0.0), 10_000.0);
        assert_eq!(polar.max_lat, 90.0);
        assert_eq!((polar.min_lng, polar.max_lng), (-180.0, 180.0));

        let dateline = bounding_box_around(&point(0.0, 179.99), 10_000.0);
        assert_eq!((dateline.min_lng, dateline.max_lng), (-180.0, 180.0));
    }
}
