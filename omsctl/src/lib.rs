//! # omsctl: Office Management Back Office
//!
//! `omsctl` is the back-office service for a network of offices grouped into governorates. It
//! records daily attendance per office and shift, damaged devices and damaged passports, lectures
//! given by staff, and file attachments for those records, and it answers the reporting queries
//! built on top of them.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for all persistence. Every request is a single round trip:
//!
//! ```text
//! HTTP route -> handler -> repository (one per table) -> PostgreSQL
//!                          \-> specification (optional filters)
//!                          \-> PagedList (offset pagination + Pagination header)
//! ```
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the REST surface under `/api/v1`. Handlers are thin: they
//! authorize the caller, convert the request body into a repository request, and map the result
//! into a response type.
//!
//! The **authentication layer** ([`auth`]) verifies bearer tokens and checks the permission codes
//! carried in their claims.
//!
//! The **database layer** ([`db`]) uses the repository pattern. Each table has a repository that
//! implements [`db::handlers::Repository`]; list and search queries share one pagination helper
//! and one filter composition mechanism.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use omsctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = omsctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     omsctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! omsctl::migrator().run(&pool).await?;
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
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::{pagination::PAGINATION_HEADER, users::Role},
    config::CorsOrigin,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
};
use axum::{
    Router,
    http::{self, HeaderName, HeaderValue},
    routing::{get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{GovernorateId, OfficeId, ProfileId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file and environment
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

/// Get the omsctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial SuperAdmin user if it doesn't exist.
///
/// Idempotent: an existing user with the same username is left untouched and its ID returned.
/// Called during startup so that there is always someone able to create the other users.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(username: &str, email: &str, db: &PgPool) -> Result<UserId, sqlx::Error> {
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo
        .get_by_username(username)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to check existing user: {e}")))?
    {
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let user_create = UserCreateDBRequest {
        username: username.to_string(),
        email: email.to_string(),
        roles: vec![Role::SuperAdmin],
        permissions: vec![],
    };

    let created_user = user_repo
        .create(&user_create)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to create admin user: {e}")))?;

    tx.commit().await?;
    info!("Created initial admin user '{}'", username);
    Ok(created_user.id)
}

/// Connect to the database, run migrations and ensure the initial admin exists
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url()
        .ok_or_else(|| anyhow::anyhow!("No database URL configured (set database.url or DATABASE_URL)"))?;

    let settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(database_url)
        .await?;

    prepare_database(config, &pool).await?;
    Ok(pool)
}

async fn prepare_database(config: &Config, pool: &PgPool) -> anyhow::Result<()> {
    migrator().run(pool).await?;

    create_initial_admin_user(&config.admin_username, &config.admin_email, pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    // Clients read page metadata from the Pagination header
    let mut exposed = vec![http::header::LOCATION, PAGINATION_HEADER.clone()];
    for name in &cors_config.exposed_headers {
        exposed.push(name.parse::<HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE, http::header::ACCEPT])
        .allow_credentials(cors_config.allow_credentials)
        .expose_headers(exposed);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// - REST API under `/api/v1`
/// - OpenAPI document at `/api-docs/openapi.json` and interactive docs at `/docs`
/// - `/healthz` liveness probe
/// - CORS and request tracing layers
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{
        attachments, attendances, damaged_devices, damaged_passports, expenses, governorates, lectures, lov, offices, profiles,
        users,
    };

    let api_routes = Router::new()
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/current", get(users::get_current_user))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        // Governorates
        .route(
            "/governorates",
            get(governorates::list_governorates).post(governorates::create_governorate),
        )
        .route(
            "/governorates/{id}",
            get(governorates::get_governorate)
                .put(governorates::update_governorate)
                .delete(governorates::delete_governorate),
        )
        // Offices
        .route("/offices", get(offices::list_offices).post(offices::create_office))
        .route("/offices/statistics", post(offices::list_office_statistics))
        .route(
            "/offices/{id}",
            get(offices::get_office).put(offices::update_office).delete(offices::delete_office),
        )
        .route("/offices/{id}/statistics", get(offices::get_office_statistics))
        // Profiles
        .route("/profiles", get(profiles::list_profiles).post(profiles::create_profile))
        .route("/profiles/search", post(profiles::search_profiles))
        .route("/profiles/user/{user_id}", get(profiles::get_profile_by_user))
        .route(
            "/profiles/{id}",
            get(profiles::get_profile).put(profiles::update_profile).delete(profiles::delete_profile),
        )
        // Attendances
        .route(
            "/attendances",
            get(attendances::list_attendances).post(attendances::create_attendance),
        )
        .route("/attendances/search", post(attendances::search_attendances))
        .route("/attendances/search/statistics", post(attendances::search_statistics))
        .route("/attendances/search/type-statistics", post(attendances::staff_type_statistics))
        .route("/attendances/statistics/office", post(attendances::office_statistics))
        .route("/attendances/statistics/unavailable", post(attendances::unavailable_offices))
        .route("/attendances/governorate-statistics", post(attendances::governorate_statistics))
        .route(
            "/attendances/{id}",
            get(attendances::get_attendance)
                .put(attendances::update_attendance)
                .delete(attendances::delete_attendance),
        )
        // Damaged devices
        .route(
            "/damaged-devices",
            get(damaged_devices::list_damaged_devices).post(damaged_devices::create_damaged_device),
        )
        .route("/damaged-devices/search", post(damaged_devices::search_damaged_devices))
        .route("/damaged-devices/search/statistics", post(damaged_devices::damaged_device_statistics))
        .route(
            "/damaged-devices/serial/{serial_number}",
            get(damaged_devices::get_damaged_devices_by_serial),
        )
        .route(
            "/damaged-devices/{id}",
            get(damaged_devices::get_damaged_device)
                .put(damaged_devices::update_damaged_device)
                .delete(damaged_devices::delete_damaged_device),
        )
        // Damaged passports
        .route(
            "/damaged-passports",
            get(damaged_passports::list_damaged_passports).post(damaged_passports::create_damaged_passport),
        )
        .route("/damaged-passports/search", post(damaged_passports::search_damaged_passports))
        .route(
            "/damaged-passports/search/statistics",
            post(damaged_passports::damaged_passport_statistics),
        )
        .route(
            "/damaged-passports/{id}",
            get(damaged_passports::get_damaged_passport)
                .put(damaged_passports::update_damaged_passport)
                .delete(damaged_passports::delete_damaged_passport),
        )
        // Lectures
        .route("/lectures", get(lectures::list_lectures).post(lectures::create_lecture))
        .route("/lectures/search", post(lectures::search_lectures))
        .route(
            "/lectures/{id}",
            get(lectures::get_lecture).put(lectures::update_lecture).delete(lectures::delete_lecture),
        )
        // Expenses
        .route(
            "/expenses/monthly",
            get(expenses::list_monthly_expenses).post(expenses::create_monthly_expenses),
        )
        .route("/expenses/monthly/search", post(expenses::search_monthly_expenses))
        .route(
            "/expenses/monthly/{id}",
            get(expenses::get_monthly_expenses)
                .put(expenses::update_monthly_expenses)
                .delete(expenses::delete_monthly_expenses),
        )
        .route(
            "/expenses/monthly/{id}/daily",
            get(expenses::list_daily_expenses).post(expenses::create_daily_expense),
        )
        .route(
            "/expenses/daily/{id}",
            put(expenses::update_daily_expense).delete(expenses::delete_daily_expense),
        )
        // Lists of values
        .route("/lov/{kind}", get(lov::list_lov).post(lov::create_lov))
        .route(
            "/lov/{kind}/{id}",
            get(lov::get_lov).put(lov::update_lov).delete(lov::delete_lov),
        )
        // Attachments
        .route("/attachments", post(attachments::create_attachment))
        .route(
            "/attachments/{id}",
            put(attachments::update_attachment).delete(attachments::delete_attachment),
        )
        .route(
            "/attachments/{entity_type}/{entity_id}",
            get(attachments::list_entity_attachments),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }));

    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled service: router, state and the resources to release on shutdown.
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

    /// Create an application, reusing `pool` instead of connecting when one is given
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting office management service with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                prepare_database(&config, &pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&app_state)?;

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
            "Office management service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
