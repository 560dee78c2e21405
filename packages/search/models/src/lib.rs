#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Search origin, filter, and ranked result types.
//!
//! A combined search ranks three kinds of records against one origin.
//! [`SearchFilter`] is applied the same way to every source and
//! [`RankedResult`] wraps whichever record matched together with its
//! distance, so ranking never has to look inside the record.

use std::cmp::Ordering;

use bloodlink_donor_models::{BloodGroup, DonorRow};
use bloodlink_facility_models::{BloodBankRecord, Facility, HospitalRecord, has_stock};
use bloodlink_geo::LngLat;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Why a search origin was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    /// `lat` or `lng` was not supplied.
    #[error("Coordinates required")]
    Missing,
    /// `lat` or `lng` is not a finite number within WGS84 bounds.
    #[error("Invalid coordinates")]
    Invalid,
}

/// The point a search is centred on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOrigin {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl SearchOrigin {
    /// Parses raw query-string coordinates.
    ///
    /// # Errors
    ///
    /// * [`OriginError::Missing`] if either value is absent or blank
    /// * [`OriginError::Invalid`] if either value does not parse as a finite
    ///   number or lies outside WGS84 bounds
    pub fn parse(lat: Option<&str>, lng: Option<&str>) -> Result<Self, OriginError> {
        let (Some(lat), Some(lng)) = (
            lat.map(str::trim).filter(|s| !s.is_empty()),
            lng.map(str::trim).filter(|s| !s.is_empty()),
        ) else {
            return Err(OriginError::Missing);
        };

        let latitude: f64 = lat.parse().map_err(|_| OriginError::Invalid)?;
        let longitude: f64 = lng.parse().map_err(|_| OriginError::Invalid)?;

        let origin = Self {
            latitude,
            longitude,
        };
        if origin.point().is_valid() {
            Ok(origin)
        } else {
            Err(OriginError::Invalid)
        }
    }

    /// The origin as a longitude-first point.
    #[must_use]
    pub const fn point(self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}

/// Attribute a search may be narrowed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FilterKind {
    /// Match on blood group.
    Blood,
    /// Match on organ.
    Organ,
}

/// Attribute predicate applied uniformly to donors, blood banks, and
/// hospitals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchFilter {
    /// Radius only.
    #[default]
    Any,
    /// Donors of this blood group, facilities stocking it.
    Blood(String),
    /// Donors pledging this organ, hospitals stocking it.
    Organ(String),
}

impl SearchFilter {
    /// Builds a filter from the raw `type` and `value` query parameters.
    ///
    /// An absent or unrecognised `type`, or an empty `value`, yields
    /// [`Self::Any`].
    #[must_use]
    pub fn from_query(kind: Option<&str>, value: Option<&str>) -> Self {
        let Some(kind) = kind.and_then(|k| k.trim().parse::<FilterKind>().ok()) else {
            return Self::Any;
        };
        let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
            return Self::Any;
        };

        match kind {
            FilterKind::Blood => Self::Blood(
                BloodGroup::from_query_value(raw)
                    .map_or_else(|| raw.trim().to_string(), |group| group.to_string()),
            ),
            FilterKind::Organ => Self::Organ(raw.trim().to_string()),
        }
    }

    /// Whether a donor satisfies this filter.
    #[must_use]
    pub fn matches_donor(&self, donor: &DonorRow) -> bool {
        match self {
            Self::Any => true,
            Self::Blood(group) => donor.blood_group.as_ref() == group,
            Self::Organ(organ) => donor.organ.as_deref() == Some(organ.as_str()),
        }
    }

    /// Whether a facility satisfies this filter.
    ///
    /// Facilities that never stock organs pass organ filters unchanged.
    #[must_use]
    pub fn matches_facility<F: Facility>(&self, facility: &F) -> bool {
        match self {
            Self::Any => true,
            Self::Blood(group) => has_stock(facility.blood_inventory(), group),
            Self::Organ(organ) => !F::STOCKS_ORGANS || has_stock(facility.organ_inventory(), organ),
        }
    }
}

/// Discriminator of a [`RankedResult`], ordered by display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Blood bank (shown first).
    BloodBank,
    /// Hospital.
    Hospital,
    /// Individual donor (shown last).
    Donor,
}

impl ResultType {
    /// Fixed priority: blood bank 1, hospital 2, donor 3.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::BloodBank => 1,
            Self::Hospital => 2,
            Self::Donor => 3,
        }
    }
}

/// A record annotated with its distance from the search origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    /// The matched record, serialized inline.
    #[serde(flatten)]
    pub record: T,
    /// Great-circle distance from the origin in meters.
    pub distance: f64,
}

impl<T> Ranked<T> {
    /// Wraps `record` with its distance.
    #[must_use]
    pub const fn new(record: T, distance: f64) -> Self {
        Self { record, distance }
    }
}

/// One entry of a combined search response.
///
/// Serialized as the record's own fields plus `distance` and a `type`
/// discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RankedResult {
    /// A blood bank.
    #[serde(rename = "bloodbank")]
    BloodBank(Ranked<BloodBankRecord>),
    /// A hospital.
    #[serde(rename = "hospital")]
    Hospital(Ranked<HospitalRecord>),
    /// A donor with the owning user's name and email.
    #[serde(rename = "donor")]
    Donor(Ranked<DonorRow>),
}

impl RankedResult {
    /// Which source this result came from.
    #[must_use]
    pub const fn result_type(&self) -> ResultType {
        match self {
            Self::BloodBank(_) => ResultType::BloodBank,
            Self::Hospital(_) => ResultType::Hospital,
            Self::Donor(_) => ResultType::Donor,
        }
    }

    /// Distance from the origin in meters.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        match self {
            Self::BloodBank(r) => r.distance,
            Self::Hospital(r) => r.distance,
            Self::Donor(r) => r.distance,
        }
    }

    /// See [`ResultType::priority`].
    #[must_use]
    pub const fn type_priority(&self) -> u8 {
        self.result_type().priority()
    }

    /// Orders by type priority, then by ascending distance.
    #[must_use]
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        self.type_priority()
            .cmp(&other.type_priority())
            .then_with(|| self.distance().total_cmp(&other.distance()))
    }
}
