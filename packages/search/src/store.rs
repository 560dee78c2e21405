//! The donor store seam.
//!
//! Search and the donor endpoints talk to donors only through
//! [`DonorStore`], so the `PostGIS` implementation can be swapped for
//! [`crate::memory::MemoryDonorStore`] when no database is available.

use std::sync::Arc;

use async_trait::async_trait;
use bloodlink_database::DbError;
use bloodlink_database::queries::{self, DonorListQuery, DonorPage};
use bloodlink_donor_models::DonorRow;
use bloodlink_geo::LngLat;
use bloodlink_search_models::SearchFilter;
use switchy_database::Database;
use uuid::Uuid;

/// Read access to persisted donors.
#[async_trait]
pub trait DonorStore: Send + Sync {
    /// Donors within `radius_meters` of `origin` matching `filter`, nearest
    /// first.
    async fn donors_within(
        &self,
        origin: LngLat,
        radius_meters: f64,
        filter: &SearchFilter,
    ) -> Result<Vec<DonorRow>, DbError>;

    /// The donor profile owned by `user_id`, if any.
    async fn donor_by_user(&self, user_id: Uuid) -> Result<Option<DonorRow>, DbError>;

    /// One page of donors, newest first.
    async fn list_donors(&self, query: &DonorListQuery) -> Result<DonorPage, DbError>;
}

/// [`DonorStore`] backed by the `PostGIS` `donors` table.
pub struct PostgisDonorStore {
    db: Arc<dyn Database>,
}

impl PostgisDonorStore {
    /// Wraps an open database connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DonorStore for PostgisDonorStore {
    async fn donors_within(
        &self,
        origin: LngLat,
        radius_meters: f64,
        filter: &SearchFilter,
    ) -> Result<Vec<DonorRow>, DbError> {
        queries::find_donors_within(self.db.as_ref(), origin, radius_meters, filter).await
    }

    async fn donor_by_user(&self, user_id: Uuid) -> Result<Option<DonorRow>, DbError> {
        queries::find_donor_by_user(self.db.as_ref(), user_id).await
    }

    async fn list_donors(&self, query: &DonorListQuery) -> Result<DonorPage, DbError> {
        queries::list_donors(self.db.as_ref(), query).await
    }
}
