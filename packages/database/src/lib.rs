#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `PostGIS` donor store.
//!
//! Two tables back the donor side of bloodlink:
//!
//! * `users`: account identity (`username`, unique `email`, `role`)
//! * `donors`: one profile per user (`user_id` is unique), with blood group,
//!   optional pledged organ, and a `GEOGRAPHY(POINT, 4326)` location behind
//!   a `GiST` index
//!
//! Blood banks and hospitals are not stored here. The SQL lives in
//! `migrations/` at the workspace root and is embedded at compile time.

pub mod db;
pub mod queries;

use include_dir::{Dir, include_dir};
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

/// `users` and `donors` schema, embedded from the workspace `migrations/`.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Donor store failures.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// A row or value could not be turned into a donor.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Brings the `users` and `donors` tables, the `postgis` extension, and the
/// donor indexes up to date.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Database migrations completed successfully");
    Ok(())
}
