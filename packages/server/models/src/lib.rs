#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the bloodlink server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the donor row type so contact details can be withheld from public
//! responses without touching the query layer.

use bloodlink_donor_models::{BloodGroup, DonorRow};
use bloodlink_geo::LngLat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when a donor's user account no longer exists.
pub const UNNAMED_DONOR: &str = "Unnamed";

/// Default page size for the donor listing.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the donor listing will serve.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for the combined search endpoint.
///
/// Coordinates are kept as raw strings so that missing and malformed
/// values can be reported with distinct messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQueryParams {
    /// Origin latitude.
    pub lat: Option<String>,
    /// Origin longitude.
    pub lng: Option<String>,
    /// Filter kind: `blood` or `organ`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Blood group or organ name to filter by.
    pub value: Option<String>,
}

/// Query parameters for the donor listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonorListParams {
    /// Filter kind: `blood` or `organ`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Blood group or organ name to filter by.
    pub value: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Case-insensitive substring matched against blood group or organ.
    pub search: Option<String>,
}

impl DonorListParams {
    /// Requested page, at least 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip before the requested page.
    #[must_use]
    pub fn offset(&self) -> u32 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Error or status message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Human-readable message.
    pub message: String,
}

impl ApiMessage {
    /// Wraps `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A donor as shown in the paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDonorSummary {
    /// Donor ID.
    pub id: String,
    /// Always `"donor"`, matching the search result discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Pledged organ.
    pub organ: Option<String>,
    /// Age in years.
    pub age: i32,
    /// Weight in kilograms.
    pub weight: Option<f64>,
    /// Free-text medical conditions.
    pub medical_conditions: Option<String>,
    /// Owning user's username, or [`UNNAMED_DONOR`].
    pub name: String,
    /// Owning user's email.
    pub email: Option<String>,
    /// Human-readable location label.
    pub location: String,
    /// Geocoded location.
    pub location_coords: Option<LngLat>,
    /// Most recent donation.
    pub last_donation: Option<DateTime<Utc>>,
}

impl From<DonorRow> for ApiDonorSummary {
    fn from(row: DonorRow) -> Self {
        Self {
            id: row.id,
            kind: "donor".to_string(),
            blood_group: row.blood_group,
            organ: row.organ,
            age: row.age,
            weight: row.weight,
            medical_conditions: row.medical_conditions,
            name: row.name.unwrap_or_else(|| UNNAMED_DONOR.to_string()),
            email: row.email,
            location: row.location,
            location_coords: row.location_coords,
            last_donation: row.last_donation,
        }
    }
}

/// One page of the donor listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorListResponse {
    /// Donors on this page, newest first.
    pub donors: Vec<ApiDonorSummary>,
    /// Total matching donors across all pages.
    pub total: u64,
    /// The page served.
    pub page: u32,
}

/// Publicly visible donor profile.
///
/// Phone and medical conditions are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDonorProfile {
    /// Donor ID.
    pub id: String,
    /// Owning user's username, or [`UNNAMED_DONOR`].
    pub name: String,
    /// Owning user's email.
    pub email: Option<String>,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Age in years.
    pub age: i32,
    /// Weight in kilograms.
    pub weight: Option<f64>,
    /// Human-readable location label.
    pub location: String,
    /// Geocoded location.
    pub location_coords: Option<LngLat>,
    /// Most recent donation.
    pub last_donation: Option<DateTime<Utc>>,
    /// When the donor was verified.
    pub verified_at: Option<DateTime<Utc>>,
    /// Profile creation time.
    pub created_at: DateTime<Utc>,
    /// Last profile update.
    pub updated_at: DateTime<Utc>,
}

impl From<DonorRow> for PublicDonorProfile {
    fn from(row: DonorRow) -> Self {
        Self {
            id: row.id,
            name: row.name.unwrap_or_else(|| UNNAMED_DONOR.to_string()),
            email: row.email,
            blood_group: row.blood_group,
            age: row.age,
            weight: row.weight,
            location: row.location,
            location_coords: row.location_coords,
            last_donation: row.last_donation,
            verified_at: row.verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Envelope for [`PublicDonorProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicDonorResponse {
    /// The profile.
    pub donor: PublicDonorProfile,
}
