#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Blood bank and hospital record types.
//!
//! These records are curated by admins as flat JSON arrays rather than
//! stored in the database, so every field is optional and loosely typed.
//! Coordinates and inventory counts are kept as raw JSON and interpreted
//! on read: a record with unusable coordinates is still a valid record, it
//! just never matches a proximity search.

use std::collections::BTreeMap;

use bloodlink_geo::LngLat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stock counts keyed by blood group (`"O+"`) or organ name (`"kidney"`).
///
/// Values are raw JSON because admin-entered files are not guaranteed to
/// hold numbers.
pub type Inventory = BTreeMap<String, Value>;

/// Identifier of a curated record.
///
/// Older entries use sequential integers, newer ones use timestamp strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacilityId {
    /// Sequential numeric ID.
    Number(i64),
    /// Opaque string ID.
    Text(String),
}

/// Whether `inventory` holds a numeric, strictly positive count for `key`.
#[must_use]
pub fn has_stock(inventory: Option<&Inventory>, key: &str) -> bool {
    inventory
        .and_then(|inv| inv.get(key))
        .and_then(Value::as_f64)
        .is_some_and(|count| count > 0.0)
}

/// Keys a search result sets on every record it returns. A record's own
/// copies are dropped so they cannot shadow the computed values.
pub const RESERVED_RESULT_FIELDS: &[&str] = &["type", "distance"];

/// Common read access used by proximity search.
pub trait Facility {
    /// Whether this kind of facility keeps an organ inventory at all.
    const STOCKS_ORGANS: bool;

    /// The record's location, if its coordinates are well-formed.
    fn coordinates(&self) -> Option<LngLat>;

    /// Blood stock by group.
    fn blood_inventory(&self) -> Option<&Inventory>;

    /// Organ stock by organ name. Always `None` when
    /// [`Self::STOCKS_ORGANS`] is `false`.
    fn organ_inventory(&self) -> Option<&Inventory>;

    /// Fields not modelled by the record type.
    fn extra_fields_mut(&mut self) -> &mut BTreeMap<String, Value>;

    /// Removes [`RESERVED_RESULT_FIELDS`] from the unmodelled fields.
    fn strip_reserved_fields(&mut self) {
        let extra = self.extra_fields_mut();
        for key in RESERVED_RESULT_FIELDS {
            extra.remove(*key);
        }
    }
}

/// A blood bank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankRecord {
    /// Record ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FacilityId>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Human-readable location label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Contact phone as shown on cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Alternate phone field written by the admin form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Website URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// `GeoJSON` point, longitude first. Kept raw; see [`Facility::coordinates`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_coords: Option<Value>,
    /// Blood stock by group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_inventory: Option<Inventory>,
    /// Fields not modelled above, echoed back unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Facility for BloodBankRecord {
    const STOCKS_ORGANS: bool = false;

    fn coordinates(&self) -> Option<LngLat> {
        self.location_coords
            .as_ref()
            .and_then(LngLat::from_geojson_value)
    }

    fn blood_inventory(&self) -> Option<&Inventory> {
        self.blood_inventory.as_ref()
    }

    fn organ_inventory(&self) -> Option<&Inventory> {
        None
    }

    fn extra_fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.extra
    }
}

/// A hospital. Same shape as [`BloodBankRecord`] plus organ stock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRecord {
    /// Record ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FacilityId>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Human-readable location label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Contact phone as shown on cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Alternate phone field written by the admin form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Website URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// `GeoJSON` point, longitude first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_coords: Option<Value>,
    /// Blood stock by group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_inventory: Option<Inventory>,
    /// Organ stock by organ name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organ_inventory: Option<Inventory>,
    /// Fields not modelled above, echoed back unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Facility for HospitalRecord {
    const STOCKS_ORGANS: bool = true;

    fn coordinates(&self) -> Option<LngLat> {
        self.location_coords
            .as_ref()
            .and_then(LngLat::from_geojson_value)
    }

    fn blood_inventory(&self) -> Option<&Inventory> {
        self.blood_inventory.as_ref()
    }

    fn organ_inventory(&self) -> Option<&Inventory> {
        self.organ_inventory.as_ref()
    }

    fn extra_fields_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.extra
    }
}
