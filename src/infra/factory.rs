use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::Repositories;
use crate::domain::services::notification::load_templates;
use crate::infra::calendar::google_calendar::GoogleCalendarProvider;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_admin_repo::PostgresAdminRepo, postgres_auth_repo::PostgresAuthRepo,
    postgres_rule_repo::PostgresRuleRepo, postgres_blackout_repo::PostgresBlackoutRepo,
    postgres_settings_repo::PostgresSettingsRepo, postgres_catalog_repo::PostgresCatalogRepo,
    postgres_booking_repo::PostgresBookingRepo, postgres_calendar_repo::PostgresCalendarRepo,
    sqlite_admin_repo::SqliteAdminRepo, sqlite_auth_repo::SqliteAuthRepo,
    sqlite_rule_repo::SqliteRuleRepo, sqlite_blackout_repo::SqliteBlackoutRepo,
    sqlite_settings_repo::SqliteSettingsRepo, sqlite_catalog_repo::SqliteCatalogRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_calendar_repo::SqliteCalendarRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let repos = connect_repositories(&config.database_url).await;

    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let calendar = Arc::new(GoogleCalendarProvider::new(config, repos.calendar_credentials.clone()));
    let templates = Arc::new(load_templates());

    AppState::new(config.clone(), repos, email_service, calendar, templates)
}

/// Picks the backend from the URL scheme and runs its migrations.
pub async fn connect_repositories(database_url: &str) -> Repositories {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        sqlite_repositories(pool)
    }
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        admins: Arc::new(SqliteAdminRepo::new(pool.clone())),
        auth: Arc::new(SqliteAuthRepo::new(pool.clone())),
        rules: Arc::new(SqliteRuleRepo::new(pool.clone())),
        blackouts: Arc::new(SqliteBlackoutRepo::new(pool.clone())),
        settings: Arc::new(SqliteSettingsRepo::new(pool.clone())),
        catalog: Arc::new(SqliteCatalogRepo::new(pool.clone())),
        bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
        calendar_credentials: Arc::new(SqliteCalendarRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        admins: Arc::new(PostgresAdminRepo::new(pool.clone())),
        auth: Arc::new(PostgresAuthRepo::new(pool.clone())),
        rules: Arc::new(PostgresRuleRepo::new(pool.clone())),
        blackouts: Arc::new(PostgresBlackoutRepo::new(pool.clone())),
        settings: Arc::new(PostgresSettingsRepo::new(pool.clone())),
        catalog: Arc::new(PostgresCatalogRepo::new(pool.clone())),
        bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
        calendar_credentials: Arc::new(PostgresCalendarRepo::new(pool)),
    }
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    info!("Running SQLite migrations...");
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

async fn run_postgres_migrations(pool: &PgPool) {
    info!("Running Postgres migrations...");
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}
