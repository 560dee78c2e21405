#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance and point helpers.
//!
//! All coordinates are WGS84 degrees. Stored points follow the `GeoJSON`
//! convention of longitude first, so [`LngLat`] serializes as
//! `{ "type": "Point", "coordinates": [lng, lat] }`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 point, longitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    /// Longitude in degrees, `-180..=180`.
    pub longitude: f64,
    /// Latitude in degrees, `-90..=90`.
    pub latitude: f64,
}

impl LngLat {
    /// Creates a new point. No validation is performed.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Whether both components are finite and within WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Leniently reads a point from loosely-typed JSON.
    ///
    /// Accepts either a `GeoJSON` point object (only `coordinates` is
    /// inspected) or a bare `[lng, lat]` array. Anything else, including a
    /// pair that is out of range, yields `None`.
    #[must_use]
    pub fn from_geojson_value(value: &Value) -> Option<Self> {
        let coordinates = match value {
            Value::Object(map) => map.get("coordinates")?,
            Value::Array(_) => value,
            _ => return None,
        };

        let Value::Array(items) = coordinates else {
            return None;
        };
        let [lng, lat] = items.as_slice() else {
            return None;
        };

        let point = Self::new(lng.as_f64()?, lat.as_f64()?);
        point.is_valid().then_some(point)
    }

    /// Renders this point as a `GeoJSON` point object.
    #[must_use]
    pub fn to_geojson_value(self) -> Value {
        serde_json::json!({
            "type": "Point",
            "coordinates": [self.longitude, self.latitude],
        })
    }

    /// Great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        haversine_meters(self, other)
    }

    /// The point reached by travelling `meters` from here along the initial
    /// `bearing_degrees` (clockwise from north) on the mean-radius sphere.
    #[must_use]
    pub fn destination(self, bearing_degrees: f64, meters: f64) -> Self {
        let angular = meters / EARTH_RADIUS_METERS;
        let bearing = bearing_degrees.to_radians();
        let lat1 = self.latitude.to_radians();
        let lng1 = self.longitude.to_radians();

        let lat2 = lat1
            .sin()
            .mul_add(angular.cos(), lat1.cos() * angular.sin() * bearing.cos())
            .asin();
        let lng2 = lng1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(lat1.sin().mul_add(-lat2.sin(), angular.cos()));

        Self::new(lng2.to_degrees(), lat2.to_degrees())
    }
}

impl Serialize for LngLat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_geojson_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LngLat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_geojson_value(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a [longitude, latitude] point"))
    }
}

/// Haversine distance between two points in meters.
///
/// The intermediate haversine term is clamped to `[0, 1]` so rounding at
/// the antipode or at identical points never feeds `asin` an out-of-domain
/// value.
#[must_use]
pub fn haversine_meters(a: LngLat, b: LngLat) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (lat1.cos() * lat2.cos())
        .mul_add((d_lng / 2.0).sin().powi(2), (d_lat / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}
