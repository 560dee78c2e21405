#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Combined proximity search over donors, blood banks, and hospitals.
//!
//! Donors come from the geo-indexed donor store; blood banks and hospitals
//! are scanned from an in-memory [`FacilitySnapshot`]. Each source yields
//! records annotated with their haversine distance from the origin, and
//! [`rank::rank`] merges them into a single list: blood banks first, then
//! hospitals, then donors, each group nearest first.
//!
//! Donor distances are recomputed locally rather than taken from the store,
//! and donors are re-checked against the radius with that distance, so all
//! three result types are measured and bounded the same way.

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod rank;
pub mod scan;
pub mod store;

use bloodlink_database::DbError;
use bloodlink_donor_models::DonorRow;
use bloodlink_facility::FacilitySnapshot;
use bloodlink_geo::LngLat;
use bloodlink_search_models::{Ranked, RankedResult, SearchFilter, SearchOrigin};

pub use store::{DonorStore, PostgisDonorStore};

/// Search radius around the origin, in meters.
pub const SEARCH_RADIUS_METERS: f64 = 50_000.0;

/// Errors that abort a combined search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The donor store query failed.
    #[error("Donor store error: {0}")]
    DonorStore(#[from] DbError),
}

/// Runs a combined search around `origin`.
///
/// The donor query and the two facility scans are independent and run
/// concurrently. Any donor store failure fails the whole search; partial
/// results are never returned.
///
/// # Errors
///
/// Returns [`SearchError`] if the donor store query fails.
pub async fn combined_search(
    store: &dyn DonorStore,
    facilities: &FacilitySnapshot,
    origin: SearchOrigin,
    filter: &SearchFilter,
) -> Result<Vec<RankedResult>, SearchError> {
    let point = origin.point();

    let (donors, (blood_banks, hospitals)) = futures::try_join!(
        nearby_donors(store, point, filter),
        async {
            Ok::<_, SearchError>((
                scan::scan_facilities(
                    &facilities.blood_banks,
                    point,
                    SEARCH_RADIUS_METERS,
                    filter,
                ),
                scan::scan_facilities(&facilities.hospitals, point, SEARCH_RADIUS_METERS, filter),
            ))
        },
    )?;

    log::debug!(
        "Search at ({}, {}) with {filter:?}: {} blood banks, {} hospitals, {} donors",
        origin.latitude,
        origin.longitude,
        blood_banks.len(),
        hospitals.len(),
        donors.len()
    );

    Ok(rank::rank(blood_banks, hospitals, donors))
}

async fn nearby_donors(
    store: &dyn DonorStore,
    origin: LngLat,
    filter: &SearchFilter,
) -> Result<Vec<Ranked<DonorRow>>, SearchError> {
    let donors = store
        .donors_within(origin, SEARCH_RADIUS_METERS, filter)
        .await?;

    Ok(donors
        .into_iter()
        .filter_map(|donor| {
            let Some(point) = donor.location_coords else {
                log::warn!("Donor {} returned without coordinates", donor.id);
                return None;
            };
            let distance = origin.distance_to(point);
            if !scan::within_radius(distance, SEARCH_RADIUS_METERS) {
                log::debug!("Dropping donor {} at {distance:.1} m", donor.id);
                return None;
            }
            Some(Ranked::new(donor, distance))
        })
        .collect())
}
