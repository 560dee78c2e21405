//! In-memory [`DonorStore`].
//!
//! Mirrors the `PostGIS` queries over a plain vector: proximity uses the
//! haversine distance, and listing orders by
//! `created_at` descending. It can also be made to fail every call, which
//! is how store outages are exercised.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bloodlink_database::DbError;
use bloodlink_database::queries::{DonorListQuery, DonorPage};
use bloodlink_donor_models::DonorRow;
use bloodlink_geo::LngLat;
use bloodlink_search_models::SearchFilter;
use uuid::Uuid;

use crate::store::DonorStore;

/// A [`DonorStore`] over a fixed list of donors.
#[derive(Debug, Default)]
pub struct MemoryDonorStore {
    donors: Vec<DonorRow>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl MemoryDonorStore {
    /// A store holding `donors`.
    #[must_use]
    pub fn new(donors: Vec<DonorRow>) -> Self {
        Self {
            donors,
            ..Self::default()
        }
    }

    /// A store whose every call fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Number of calls made against this store so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn begin(&self) -> Result<(), DbError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.unavailable {
            return Err(DbError::Conversion {
                message: "donor store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DonorStore for MemoryDonorStore {
    async fn donors_within(
        &self,
        origin: LngLat,
        radius_meters: f64,
        filter: &SearchFilter,
    ) -> Result<Vec<DonorRow>, DbError> {
        self.begin()?;

        let mut matches: Vec<(f64, &DonorRow)> = self
            .donors
            .iter()
            .filter(|donor| filter.matches_donor(donor))
            .filter_map(|donor| {
                let distance = origin.distance_to(donor.location_coords?);
                (distance <= radius_meters).then_some((distance, donor))
            })
            .collect();
        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(matches.into_iter().map(|(_, donor)| donor.clone()).collect())
    }

    async fn donor_by_user(&self, user_id: Uuid) -> Result<Option<DonorRow>, DbError> {
        self.begin()?;
        Ok(self
            .donors
            .iter()
            .find(|d| d.user_id.parse::<Uuid>().is_ok_and(|id| id == user_id))
            .cloned())
    }

    async fn list_donors(&self, query: &DonorListQuery) -> Result<DonorPage, DbError> {
        self.begin()?;

        let term = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&DonorRow> = self
            .donors
            .iter()
            .filter(|donor| query.filter.matches_donor(donor))
            .filter(|donor| {
                term.as_deref().is_none_or(|term| {
                    donor.blood_group.as_ref().to_lowercase().contains(term)
                        || donor
                            .organ
                            .as_deref()
                            .is_some_and(|organ| organ.to_lowercase().contains(term))
                })
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let donors = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(DonorPage { donors, total })
    }
}
