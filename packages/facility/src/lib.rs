#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory catalog of admin-curated blood banks and hospitals.
//!
//! Both collections are JSON arrays on disk, written by the admin panel
//! and read here wholesale. The catalog hands out immutable
//! [`FacilitySnapshot`]s: a search keeps the snapshot it started with even
//! if [`FacilityCatalog::reload`] swaps in a newer one mid-request. Edits
//! to the files become visible to searches only after the next reload, so
//! there is no read-after-write consistency between an admin edit and a
//! search.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use bloodlink_facility_models::{BloodBankRecord, Facility, HospitalRecord};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// File name of the blood bank collection inside the data directory.
pub const BLOOD_BANKS_FILE: &str = "bloodbanks.json";

/// File name of the hospital collection inside the data directory.
pub const HOSPITALS_FILE: &str = "hospitals.json";

/// Errors that can occur while loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The collection file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The collection file is not a JSON array.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Locations of the two collection files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    /// Blood bank JSON array.
    pub blood_banks: PathBuf,
    /// Hospital JSON array.
    pub hospitals: PathBuf,
}

impl CatalogPaths {
    /// Standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            blood_banks: dir.join(BLOOD_BANKS_FILE),
            hospitals: dir.join(HOSPITALS_FILE),
        }
    }
}

/// An immutable view of both collections.
#[derive(Debug, Clone)]
pub struct FacilitySnapshot {
    /// All blood banks, including ones with unusable coordinates.
    pub blood_banks: Vec<BloodBankRecord>,
    /// All hospitals, including ones with unusable coordinates.
    pub hospitals: Vec<HospitalRecord>,
    /// When this snapshot was built.
    pub loaded_at: DateTime<Utc>,
}

impl FacilitySnapshot {
    /// Builds a snapshot from already-parsed records.
    #[must_use]
    pub fn new(blood_banks: Vec<BloodBankRecord>, hospitals: Vec<HospitalRecord>) -> Self {
        Self {
            blood_banks,
            hospitals,
            loaded_at: Utc::now(),
        }
    }
}

/// Owner of the current [`FacilitySnapshot`].
///
/// Built either from files ([`Self::load`]) or directly from records
/// ([`Self::from_collections`]); the latter has nothing to reload from.
pub struct FacilityCatalog {
    paths: Option<CatalogPaths>,
    current: RwLock<Arc<FacilitySnapshot>>,
}

impl FacilityCatalog {
    /// Reads both collection files.
    ///
    /// A missing file loads as an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if a file exists but cannot be read or is
    /// not a JSON array.
    pub fn load(paths: CatalogPaths) -> Result<Self, CatalogError> {
        let snapshot = read_snapshot(&paths)?;
        Ok(Self {
            paths: Some(paths),
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Builds a catalog that is not backed by files.
    #[must_use]
    pub fn from_collections(
        blood_banks: Vec<BloodBankRecord>,
        hospitals: Vec<HospitalRecord>,
    ) -> Self {
        Self {
            paths: None,
            current: RwLock::new(Arc::new(FacilitySnapshot::new(blood_banks, hospitals))),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FacilitySnapshot> {
        Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Re-reads both files and swaps in the new snapshot.
    ///
    /// Snapshots already handed out are unaffected. A catalog built with
    /// [`Self::from_collections`] returns its current snapshot unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if either file fails to load; the previous
    /// snapshot stays current.
    pub fn reload(&self) -> Result<Arc<FacilitySnapshot>, CatalogError> {
        let Some(paths) = &self.paths else {
            return Ok(self.snapshot());
        };

        let snapshot = Arc::new(read_snapshot(paths)?);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);

        log::debug!(
            "Reloaded facility catalog: {} blood banks, {} hospitals",
            snapshot.blood_banks.len(),
            snapshot.hospitals.len()
        );

        Ok(snapshot)
    }
}

fn read_snapshot(paths: &CatalogPaths) -> Result<FacilitySnapshot, CatalogError> {
    let blood_banks = read_collection(&paths.blood_banks, "blood bank")?;
    let hospitals = read_collection(&paths.hospitals, "hospital")?;
    log::info!(
        "Loaded {} blood banks and {} hospitals",
        blood_banks.len(),
        hospitals.len()
    );
    warn_unlocated(&blood_banks, "blood bank");
    warn_unlocated(&hospitals, "hospital");
    Ok(FacilitySnapshot::new(blood_banks, hospitals))
}

/// Records without usable coordinates stay in the catalog but can never
/// match a proximity search.
fn warn_unlocated<F: Facility>(records: &[F], label: &str) {
    let unlocated = records.iter().filter(|r| r.coordinates().is_none()).count();
    if unlocated > 0 {
        log::warn!("{unlocated} {label} records have no usable coordinates");
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path, label: &str) -> Result<Vec<T>, CatalogError> {
    if !path.exists() {
        log::warn!(
            "{label} collection {} not found, starting empty",
            path.display()
        );
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_collection(&contents, label).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a JSON array of records, skipping entries that do not fit `T`.
///
/// # Errors
///
/// Returns an error only if `json` is not a JSON array.
pub fn parse_collection<T: DeserializeOwned>(
    json: &str,
    label: &str,
) -> Result<Vec<T>, serde_json::Error> {
    let items: Vec<Value> = serde_json::from_str(json)?;
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping malformed {label} record #{index}: {e}"),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn skips_records_that_are_not_objects() {
        let json = r#"[
            { "id": 1, "name": "Good" },
            42,
            { "id": 2, "name": 17 },
            { "id": 3, "name": "Also good", "locationCoords": null }
        ]"#;

        let records: Vec<BloodBankRecord> = parse_collection(json, "blood bank").unwrap();
        let names: Vec<_> = records.iter().filter_map(|r| r.name.as_deref()).collect();

        assert_eq!(names, ["Good", "Also good"]);
    }

    #[test]
    fn rejects_non_array_document() {
        assert!(parse_collection::<HospitalRecord>(r#"{ "id": 1 }"#, "hospital").is_err());
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = FacilityCatalog::load(CatalogPaths::in_dir(dir.path())).unwrap();
        let snapshot = catalog.snapshot();

        assert!(snapshot.blood_banks.is_empty());
        assert!(snapshot.hospitals.is_empty());
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(BLOOD_BANKS_FILE), "not json").unwrap();

        let result = FacilityCatalog::load(CatalogPaths::in_dir(dir.path()));

        assert!(matches!(result, Err(CatalogError::Json { .. })));
    }

    #[test]
    fn reload_swaps_snapshot_without_touching_held_ones() {
        let dir = TempDir::new().unwrap();
        let paths = CatalogPaths::in_dir(dir.path());
        std::fs::write(&paths.blood_banks, r#"[{ "id": 1, "name": "First" }]"#).unwrap();

        let catalog = FacilityCatalog::load(paths.clone()).unwrap();
        let held = catalog.snapshot();

        std::fs::write(
            &paths.blood_banks,
            r#"[{ "id": 1, "name": "First" }, { "id": 2, "name": "Second" }]"#,
        )
        .unwrap();
        std::fs::write(&paths.hospitals, r#"[{ "id": 9, "name": "General" }]"#).unwrap();

        let fresh = catalog.reload().unwrap();

        assert_eq!(held.blood_banks.len(), 1);
        assert!(held.hospitals.is_empty());
        assert_eq!(fresh.blood_banks.len(), 2);
        assert_eq!(fresh.hospitals.len(), 1);
        assert_eq!(catalog.snapshot().blood_banks.len(), 2);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let paths = CatalogPaths::in_dir(dir.path());
        std::fs::write(&paths.hospitals, r#"[{ "id": 1, "name": "General" }]"#).unwrap();

        let catalog = FacilityCatalog::load(paths.clone()).unwrap();
        std::fs::write(&paths.hospitals, "[{ broken").unwrap();

        assert!(catalog.reload().is_err());
        assert_eq!(catalog.snapshot().hospitals.len(), 1);
    }

    #[test]
    fn in_memory_catalog_reload_is_noop() {
        let catalog = FacilityCatalog::from_collections(
            vec![BloodBankRecord {
                name: Some("Fixture".to_string()),
                ..Default::default()
            }],
            Vec::new(),
        );

        let snapshot = catalog.reload().unwrap();

        assert_eq!(snapshot.blood_banks.len(), 1);
        assert!(Arc::ptr_eq(&snapshot, &catalog.snapshot()));
    }
}
