//! # hrctl: CRUD backend for the HR schema
//!
//! `hrctl` persists and serves the classic HR domain: regions, countries, locations,
//! departments, employees (with a self-referencing manager), jobs, tasks and job history. It
//! exposes a RESTful API for creating, reading, updating, partially updating and deleting every
//! kind, backed by PostgreSQL.
//!
//! ## Overview
//!
//! Instead of one hand-written repository, row mapper and query per entity kind, the data layer is
//! table driven. Each kind is described once by a static descriptor (its table, the to-one
//! relations to left-join on every read, and the link tables of its many-to-many associations),
//! and a single generic repository reads and writes all of them:
//!
//! - reads run one SELECT that joins every to-one relation, labelling columns by table alias so
//!   the same table can be joined twice (an employee and their manager);
//! - writes build their INSERT/UPDATE from the entity's column values, then reconcile the link
//!   table rows against the in-memory id set (insert what is missing, delete what is stale);
//! - deletes remove link rows first and the entity row second.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! [SQLx](https://github.com/launchbadge/sqlx) with PostgreSQL for persistence.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) serves `/api/{kind}` for every entity kind with the same six routes,
//! including paging, sorting, column filters and alert headers.
//!
//! The **service layer** ([`service`]) wraps multi-step writes in a transaction and enforces
//! entity field rules.
//!
//! The **database layer** ([`db`]) holds the descriptors, the row mapping, the joined query
//! builder, the link table manager and the generic repository.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use hrctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = hrctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize structured logging
//!     hrctl::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and runs the baseline schema migration on
//! startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! hrctl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod service;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use axum::{Router, routing::get};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the hrctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the configured database and bring the schema up to date.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = db::pools::connect(&config.database.url, &config.database.pool).await?;
    migrator().run(&pool).await?;
    Ok(pool)
}

/// Build the application router: the entity API under `/api` plus a liveness probe.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api::handlers::api_routes())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns the router, configuration and pool.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database and runs migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, in-flight requests finish and the pool
///    is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool (migrations are still run), or connect when
    /// `pool` is `None`. The configuration is validated first.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting hrctl with configuration: {:#?}", config);
        config.validate()?;

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state);

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "hrctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config};
    use serde_json::{Value, json};

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_route_is_not_found(pool: PgPool) {
        let server = create_test_app(pool).await;
        server.get("/api/payrolls").await.assert_status_not_found();
    }

    /// Region "Europe" and Country "France" pointing at it: the country comes back with the
    /// region's name through the join, over HTTP.
    #[sqlx::test]
    #[test_log::test]
    async fn test_country_reads_region_through_the_api(pool: PgPool) {
        let server = create_test_app(pool).await;

        let region: Value = server.post("/api/regions").json(&json!({ "region_name": "Europe" })).await.json();
        let country: Value = server
            .post("/api/countries")
            .json(&json!({ "country_name": "France", "region_id": region["id"] }))
            .await
            .json();

        let fetched: Value = server.get(&format!("/api/countries/{}", country["id"])).await.json();
        assert_eq!(fetched["country_name"], "France");
        assert_eq!(fetched["region"]["region_name"], "Europe");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_alert_headers_follow_application_name(pool: PgPool) {
        let mut config = create_test_config();
        config.application_name = "hrapp".to_string();
        let server = Application::new_with_pool(config, Some(pool))
            .await
            .expect("Failed to create application")
            .into_test_server();

        let response = server.post("/api/tasks").json(&json!({ "title": "Review" })).await;
        assert_eq!(response.header("x-hrapp-alert"), "hrapp.task.created");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_pagination_config_is_refused(pool: PgPool) {
        let mut config = create_test_config();
        config.pagination.max_size = 0;

        let result = Application::new_with_pool(config, Some(pool)).await;
        let Err(err) = result else {
            panic!("an application with max_size = 0 should not start");
        };
        assert!(err.to_string().contains("pagination sizes must be at least 1"));
    }
}
