#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for bloodlink.
//!
//! Serves the combined proximity search over donors, blood banks, and
//! hospitals, plus the read-only public donor endpoints. Donors are read
//! from `PostGIS`; blood banks and hospitals come from JSON files that are
//! reloaded in the background.

pub mod config;
mod handlers;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use bloodlink_database::{db, run_migrations};
use bloodlink_facility::{CatalogPaths, FacilityCatalog};
use bloodlink_search::{DonorStore, PostgisDonorStore};
use switchy_database::Database;

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Donor store used by search and the donor endpoints.
    pub donors: Arc<dyn DonorStore>,
    /// Blood bank and hospital catalog.
    pub catalog: Arc<FacilityCatalog>,
}

/// Registers the `/api` routes.
///
/// Expects a `web::Data<AppState>` to be registered on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(handlers::query_error))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/search", web::get().to(handlers::search))
                .route("/donors", web::get().to(handlers::list_donors))
                .route(
                    "/donors/public/{user_id}",
                    web::get().to(handlers::public_donor),
                ),
        );
}

/// Starts the bloodlink API server.
///
/// Connects to the `PostGIS` database, runs migrations, loads the facility
/// catalog, schedules its background reload, and starts the Actix-Web HTTP
/// server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database is unreachable,
/// migrations fail, the catalog files are unreadable, or the HTTP server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> io::Result<()> {
    log::info!("Connecting to database...");
    let db_conn = db::connect(&config.database_url)
        .await
        .map_err(|e| io::Error::other(format!("Failed to connect to database: {e}")))?;

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .map_err(|e| io::Error::other(format!("Failed to run migrations: {e}")))?;

    log::info!(
        "Loading facility catalog from {}...",
        config.data_dir.display()
    );
    let catalog = Arc::new(
        FacilityCatalog::load(CatalogPaths::in_dir(&config.data_dir)).map_err(io::Error::other)?,
    );

    if let Some(period) = config.reload_interval {
        spawn_catalog_reload(Arc::clone(&catalog), period);
    }

    let db: Arc<dyn Database> = Arc::from(db_conn);
    let state = web::Data::new(AppState {
        donors: Arc::new(PostgisDonorStore::new(db)),
        catalog,
    });

    let ServerConfig {
        bind_addr,
        port,
        cors_origin,
        ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = cors_origin.as_deref().map_or_else(Cors::permissive, |origin| {
            Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
        });

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Re-reads the catalog files every `period` on the blocking pool.
///
/// A failed reload is logged and the previous snapshot stays in service.
fn spawn_catalog_reload(catalog: Arc<FacilityCatalog>, period: Duration) {
    log::info!("Reloading facility catalog every {}s", period.as_secs());

    actix_rt::spawn(async move {
        let mut interval = actix_rt::time::interval(period);
        // First tick fires immediately; the catalog was just loaded.
        interval.tick().await;

        loop {
            interval.tick().await;
            let catalog = Arc::clone(&catalog);
            match web::block(move || catalog.reload()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => log::error!("Failed to reload facility catalog: {e}"),
                Err(e) => log::error!("Facility catalog reload was cancelled: {e}"),
            }
        }
    });
}
