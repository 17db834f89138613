//! # microjobs: marketplace backend with time-boxed job reservations
//!
//! `microjobs` serves the HTTP API of a small-jobs marketplace. Employers post jobs, workers
//! browse them, bookmark favorites, invite each other through referral codes and
//! can *reserve* a job, which holds it for them alone for a configurable number of hours.
//!
//! ## Reservations
//!
//! A reservation lives in two places: the `is_reserved`/`reserved_by`/`reserved_until`
//! columns of the job and a row in `job_reservations`. The [`reservations`] module keeps the
//! two in step. A reservation whose deadline has passed is expired lazily, the first time
//! anyone checks the job's status, and eagerly by a background sweeper that runs every
//! `background_services.reservation_sweeper.interval`. Both paths are idempotent, so any
//! number of replicas can run the sweeper at once.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) and PostgreSQL.
//!
//! - The **API layer** ([`api`]) holds handlers and wire models. All routes except `/health`
//!   and `/docs` are under `/api`.
//! - The **authentication layer** ([`auth`]) verifies bearer session tokens (JWT) and checks
//!   admin-only operations.
//! - The **database layer** ([`db`]) uses the repository pattern; every repository borrows a
//!   `PgConnection`, so callers decide whether work runs inside a transaction.
//! - The **reservation service** ([`reservations`]) implements status checks, expiry,
//!   reserve/cancel and the sweep.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use microjobs::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = microjobs::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     microjobs::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup. To run them by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! microjobs::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod reservations;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{config::CorsOrigin, openapi::ApiDoc};
use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{CategoryId, JobId, ReservationId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the microjobs database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the configured database and bring its schema up to date.
#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(non_zero(settings.idle_timeout_secs))
        .max_lifetime(non_zero(settings.max_lifetime_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Url serializes a bare origin with a trailing slash, which browsers never send
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: `/health`, the `/api` routes, the API docs, CORS and
/// request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{commission, cron, favorites, jobs, referrals, reservation_settings, reservations};

    let api_routes = Router::new()
        // Jobs and reservations
        .route("/jobs", get(jobs::list_jobs).put(jobs::update_job_workers))
        .route("/jobs/reserve", post(reservations::reserve))
        .route("/jobs/{id}/reservation", get(jobs::get_reservation_status))
        .route("/reservations/cancel", post(reservations::cancel))
        .route("/reservations/check-expiry", post(reservations::check_expiry))
        .route("/reservations/user", get(reservations::list_mine))
        .route("/reservations/cleanup", get(reservations::cleanup).post(reservations::cleanup))
        // Favorites
        .route(
            "/favorites",
            get(favorites::list_favorites)
                .post(favorites::add_favorite)
                .delete(favorites::remove_favorite),
        )
        // Referrals
        .route("/referrals", get(referrals::get_referrals))
        .route("/referrals/generate-code", post(referrals::generate_code))
        // Admin
        .route(
            "/admin/commission",
            get(commission::get_commission_settings).put(commission::update_commission_settings),
        )
        .route(
            "/admin/reservation-settings",
            get(reservation_settings::get_settings).post(reservation_settings::update_settings),
        )
        // Scheduler hook
        .route(
            "/cron/expire-reservations",
            get(cron::expire_reservations).post(cron::expire_reservations),
        );

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/health", get(api::handlers::health::health))
        .nest("/api", api_routes)
        .with_state(state)
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Background tasks running alongside the HTTP server.
///
/// Dropping this without calling [`shutdown`](BackgroundServices::shutdown) still cancels
/// the tasks through the drop guard.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();

        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

/// Start the background services enabled in `config`.
fn setup_background_services(pool: PgPool, config: &Config, shutdown_token: CancellationToken) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    let mut background_tasks = Vec::new();

    let sweeper_config = config.background_services.reservation_sweeper.clone();
    if sweeper_config.enabled {
        background_tasks.push(tokio::spawn(reservations::sweeper::run_reservation_sweeper(
            sweeper_config,
            pool,
            shutdown_token.clone(),
        )));
    } else {
        info!("Reservation sweeper disabled by configuration");
    }

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations and starts
///    background services
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, stops background services and
///    closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create the application on an existing pool, or connect per `config` when `pool` is `None`.
    ///
    /// A supplied pool is migrated as well.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting microjobs with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let bg_services = setup_background_services(pool.clone(), &config, CancellationToken::new());

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Microjobs listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.bg_services.shutdown().await;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[sqlx::test]
    #[test_log::test]
    async fn test_health_and_docs_are_public(pool: PgPool) {
        let (server, _bg_services) = create_test_app(pool).await;

        server.get("/health").await.assert_status_ok();

        let spec = server.get("/api-docs/openapi.json").await;
        spec.assert_status_ok();
        assert!(spec.text().contains("Microjobs API"));

        server.get("/docs").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_route_is_404(pool: PgPool) {
        let (server, _bg_services) = create_test_app(pool).await;
        server.get("/api/nope").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = create_test_config();
        assert!(create_cors_layer(&config).is_ok());

        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.cors.allow_credentials = false;
        assert!(create_cors_layer(&config).is_ok());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_background_services_shutdown(pool: PgPool) {
        let mut config = create_test_config();
        config.background_services.reservation_sweeper.enabled = true;
        config.background_services.reservation_sweeper.interval = Duration::from_millis(50);

        let services = setup_background_services(pool, &config, CancellationToken::new());
        assert_eq!(services.background_tasks.len(), 1);

        tokio::time::timeout(Duration::from_secs(5), services.shutdown())
            .await
            .expect("background services did not stop");
    }
}
