#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Blood group taxonomy and donor row types.
//!
//! A donor is a verified user who can be contacted for blood or organ
//! donation. Donor rows live in `PostGIS`; the owning user's display name
//! and email are projected onto the row at query time rather than stored
//! twice.

use bloodlink_geo::LngLat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// ABO/Rh blood group.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum BloodGroup {
    /// A positive
    #[serde(rename = "A+")]
    #[strum(serialize = "A+")]
    APositive,
    /// A negative
    #[serde(rename = "A-")]
    #[strum(serialize = "A-")]
    ANegative,
    /// B positive
    #[serde(rename = "B+")]
    #[strum(serialize = "B+")]
    BPositive,
    /// B negative
    #[serde(rename = "B-")]
    #[strum(serialize = "B-")]
    BNegative,
    /// AB positive
    #[serde(rename = "AB+")]
    #[strum(serialize = "AB+")]
    AbPositive,
    /// AB negative
    #[serde(rename = "AB-")]
    #[strum(serialize = "AB-")]
    AbNegative,
    /// O positive
    #[serde(rename = "O+")]
    #[strum(serialize = "O+")]
    OPositive,
    /// O negative
    #[serde(rename = "O-")]
    #[strum(serialize = "O-")]
    ONegative,
}

impl BloodGroup {
    /// Returns all blood groups.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::APositive,
            Self::ANegative,
            Self::BPositive,
            Self::BNegative,
            Self::AbPositive,
            Self::AbNegative,
            Self::OPositive,
            Self::ONegative,
        ]
    }

    /// Parses a blood group taken from a URL query string.
    ///
    /// Form decoding turns `+` into a space, so `"O "` is read as `O+`.
    #[must_use]
    pub fn from_query_value(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Ok(group) = trimmed.parse() {
            return Some(group);
        }
        if raw.ends_with(' ') && !trimmed.is_empty() {
            return format!("{trimmed}+").parse().ok();
        }
        None
    }
}

/// A donor row joined with its owning user's display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorRow {
    /// Donor primary key.
    pub id: String,
    /// Owning user. Unique across donors.
    pub user_id: String,
    /// Owning user's username, if the user still exists.
    pub name: Option<String>,
    /// Owning user's email, if the user still exists.
    pub email: Option<String>,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Organ the donor has pledged, if any.
    pub organ: Option<String>,
    /// Age in years.
    pub age: i32,
    /// Weight in kilograms.
    pub weight: Option<f64>,
    /// Free-text medical conditions.
    pub medical_conditions: Option<String>,
    /// Human-readable location label.
    pub location: String,
    /// Geocoded location.
    pub location_coords: Option<LngLat>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Most recent donation.
    pub last_donation: Option<DateTime<Utc>>,
    /// When an admin verified the donor application.
    pub verified_at: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}
