#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance and radius filtering.
//!
//! Distances use the haversine formula on a sphere with a fixed radius of
//! [`EARTH_RADIUS_KM`]. Coordinates are decimal degrees and are not
//! validated; any finite input produces a finite, non-negative distance.

use geo::Point;
use serde::{Deserialize, Serialize};

/// Earth radius used for every distance computation, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Something with a position that can carry its distance to a search
/// center once it has been measured.
pub trait Located {
    /// Latitude in decimal degrees.
    fn latitude(&self) -> f64;

    /// Longitude in decimal degrees.
    fn longitude(&self) -> f64;

    /// Records the measured distance (km) from the search center.
    fn set_distance_km(&mut self, distance_km: f64);

    /// The position as a [`Point`] (`x` = longitude, `y` = latitude).
    fn position(&self) -> Point<f64> {
        Point::new(self.longitude(), self.latitude())
    }
}

/// Great-circle distance in kilometers between two points given in
/// decimal degrees.
///
/// Symmetric in its endpoints and zero for identical points.
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlat = lat2 - lat1;
    let dlon = lon2.to_radians() - lon1.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Same as [`haversine_distance`] for two [`Point`]s (`x` = longitude,
/// `y` = latitude).
#[must_use]
pub fn point_distance_km(a: Point<f64>, b: Point<f64>) -> f64 {
    haversine_distance(a.y(), a.x(), b.y(), b.x())
}

/// Keeps the points within `radius_km` of the center, boundary included,
/// and annotates each survivor with its distance.
///
/// A missing, zero, negative, or NaN radius disables the filter and the
/// input is returned untouched (no distances are annotated).
#[must_use]
pub fn filter_by_radius<T: Located>(
    points: Vec<T>,
    center_lat: f64,
    center_lon: f64,
    radius_km: Option<f64>,
) -> Vec<T> {
    match radius_km.filter(|r| *r > 0.0) {
        Some(radius_km) => filter_within(points, Point::new(center_lon, center_lat), radius_km),
        None => points,
    }
}

fn filter_within<T: Located>(points: Vec<T>, center: Point<f64>, radius_km: f64) -> Vec<T> {
    let total = points.len();
    let kept: Vec<T> = points
        .into_iter()
        .filter_map(|mut point| {
            let distance = point_distance_km(center, point.position());
            if distance <= radius_km {
                point.set_distance_km(distance);
                Some(point)
            } else {
                None
            }
        })
        .collect();

    log::debug!(
        "Radius filter kept {}/{total} points within {radius_km} km of ({}, {})",
        kept.len(),
        center.y(),
        center.x()
    );

    kept
}

/// An active geographic filter: a center and a radius in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFilter {
    /// Center latitude.
    pub center_lat: f64,
    /// Center longitude.
    pub center_lon: f64,
    /// Search radius in kilometers.
    pub radius_km: f64,
}

impl GeoFilter {
    #[must_use]
    pub const fn new(center_lat: f64, center_lon: f64, radius_km: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            radius_km,
        }
    }

    /// The center as a [`Point`].
    #[must_use]
    pub fn center(&self) -> Point<f64> {
        Point::new(self.center_lon, self.center_lat)
    }

    /// Radius in meters, as map circle overlays expect.
    #[must_use]
    pub fn radius_m(&self) -> f64 {
        self.radius_km * 1000.0
    }

    /// Applies [`filter_by_radius`] with this filter's center and radius.
    #[must_use]
    pub fn apply<T: Located>(&self, points: Vec<T>) -> Vec<T> {
        if self.radius_km > 0.0 {
            filter_within(points, self.center(), self.radius_km)
        } else {
            points
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pin {
        id: u32,
        lat: f64,
        lon: f64,
        distance_km: Option<f64>,
    }

    impl Pin {
        const fn new(id: u32, lat: f64, lon: f64) -> Self {
            Self {
                id,
                lat,
                lon,
                distance_km: None,
            }
        }
    }

    impl Located for Pin {
        fn latitude(&self) -> f64 {
            self.lat
        }

        fn longitude(&self) -> f64 {
            self.lon
        }

        fn set_distance_km(&mut self, distance_km: f64) {
            self.distance_km = Some(distance_km);
        }
    }

    fn pins() -> Vec<Pin> {
        vec![
            Pin::new(1, 13.6929, -89.2182),
            Pin::new(2, 13.6769, -89.2797),
            Pin::new(3, 13.6647, -89.2539),
            Pin::new(4, 13.7102, -89.1397),
            Pin::new(5, 13.7250, -89.2119),
            Pin::new(6, 13.4833, -88.1833),
        ]
    }

    fn ids(pins: &[Pin]) -> Vec<u32> {
        pins.iter().map(|p| p.id).collect()
    }

    #[test]
    fn distance_to_self_is_zero() {
        for (lat, lon) in [(13.6929, -89.2182), (0.0, 0.0), (-33.86, 151.2), (89.9, 179.9)] {
            assert!(haversine_distance(lat, lon, lat, lon).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((13.6929, -89.2182), (13.6769, -89.2797)),
            ((40.7128, -74.0060), (51.5074, -0.1278)),
            ((-33.86, 151.2), (35.68, 139.69)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let ab = haversine_distance(lat1, lon1, lat2, lon2);
            let ba = haversine_distance(lat2, lon2, lat1, lon1);
            assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
        }
    }

    #[test]
    fn san_salvador_to_santa_tecla() {
        let d = haversine_distance(13.6929, -89.2182, 13.6769, -89.2797);
        assert!((d - 6.7).abs() < 0.5, "unexpected distance {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn point_distance_matches_coordinates() {
        let a = Point::new(-89.2182, 13.6929);
        let b = Point::new(-89.2797, 13.6769);
        let expected = haversine_distance(13.6929, -89.2182, 13.6769, -89.2797);
        assert!((point_distance_km(a, b) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn position_is_lon_lat_point() {
        let pin = Pin::new(1, 13.6929, -89.2182);
        assert_eq!(pin.position(), Point::new(-89.2182, 13.6929));
    }

    #[test]
    fn non_positive_or_missing_radius_is_a_no_op() {
        let input = pins();
        assert_eq!(filter_by_radius(input.clone(), 13.6929, -89.2182, None), input);
        assert_eq!(filter_by_radius(input.clone(), 13.6929, -89.2182, Some(0.0)), input);
        assert_eq!(filter_by_radius(input.clone(), 13.6929, -89.2182, Some(-3.0)), input);
        assert_eq!(
            filter_by_radius(input.clone(), 13.6929, -89.2182, Some(f64::NAN)),
            input
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        let out: Vec<Pin> = filter_by_radius(Vec::new(), 13.6929, -89.2182, Some(5.0));
        assert!(out.is_empty());
    }

    #[test]
    fn keeps_only_points_inside_radius() {
        let out = filter_by_radius(pins(), 13.6929, -89.2182, Some(4.0));
        assert_eq!(ids(&out), vec![1, 5]);
        for pin in &out {
            let d = pin.distance_km.expect("distance annotated");
            assert!(d <= 4.0);
        }
    }

    #[test]
    fn larger_radius_is_superset() {
        for radius in [1.0, 4.0, 8.0, 20.0, 200.0] {
            let big = ids(&filter_by_radius(pins(), 13.6929, -89.2182, Some(radius)));
            let small = ids(&filter_by_radius(pins(), 13.6929, -89.2182, Some(radius / 2.0)));
            assert!(
                small.iter().all(|id| big.contains(id)),
                "radius {radius}: {small:?} not within {big:?}"
            );
        }
    }

    #[test]
    fn boundary_distance_is_inclusive() {
        let target = Pin::new(9, 13.6769, -89.2797);
        let exact = haversine_distance(13.6929, -89.2182, target.lat, target.lon);
        let out = filter_by_radius(vec![target], 13.6929, -89.2182, Some(exact));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].distance_km, Some(exact));
    }

    #[test]
    fn geo_filter_converts_units_and_applies() {
        let filter = GeoFilter::new(13.6929, -89.2182, 2.5);
        assert!((filter.radius_m() - 2500.0).abs() < f64::EPSILON);
        assert!((filter.center().x() - -89.2182).abs() < f64::EPSILON);
        assert!((filter.center().y() - 13.6929).abs() < f64::EPSILON);
        assert_eq!(ids(&filter.apply(pins())), vec![1]);
        assert_eq!(GeoFilter::new(13.6929, -89.2182, 0.0).apply(pins()), pins());
    }
}
