pub mod sqlite_admin_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_rule_repo;
pub mod sqlite_blackout_repo;
pub mod sqlite_settings_repo;
pub mod sqlite_catalog_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_calendar_repo;

pub mod postgres_admin_repo;
pub mod postgres_auth_repo;
pub mod postgres_rule_repo;
pub mod postgres_blackout_repo;
pub mod postgres_settings_repo;
pub mod postgres_catalog_repo;
pub mod postgres_booking_repo;
pub mod postgres_calendar_repo;
