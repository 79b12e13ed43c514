use crate::domain::models::{
    admin::Admin, auth::RefreshTokenRecord,
    availability::{AvailabilityRule, BlackoutDate}, settings::BookingSettings,
    catalog::{Service, ServiceCategory, TaxRate}, booking::{Booking, BookingFilter},
    calendar::{CalendarCredential, CalendarSummary, EventDraft, RemoteEvent},
};
use crate::error::{AppError, CalendarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: &Admin) -> Result<Admin, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Admin>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Admin>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait AvailabilityRuleRepository: Send + Sync {
    async fn create(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError>;
    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<AvailabilityRule>, AppError>;
    async fn list(&self, admin_id: &str) -> Result<Vec<AvailabilityRule>, AppError>;
    async fn list_active(&self, admin_id: &str) -> Result<Vec<AvailabilityRule>, AppError>;
    async fn update(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError>;
    async fn delete(&self, admin_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BlackoutRepository: Send + Sync {
    async fn create(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError>;
    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<BlackoutDate>, AppError>;
    async fn list(&self, admin_id: &str) -> Result<Vec<BlackoutDate>, AppError>;
    async fn list_by_range(&self, admin_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<BlackoutDate>, AppError>;
    async fn update(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError>;
    async fn delete(&self, admin_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingSettingsRepository: Send + Sync {
    async fn find(&self, admin_id: &str) -> Result<Option<BookingSettings>, AppError>;
    async fn upsert(&self, settings: &BookingSettings) -> Result<BookingSettings, AppError>;
    async fn set_external_calendar(&self, admin_id: &str, calendar_id: Option<&str>) -> Result<(), AppError>;
}

/// Catalog rows are never hard-deleted: bookings keep pointing at them.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_tax_rate(&self, rate: &TaxRate) -> Result<TaxRate, AppError>;
    async fn find_tax_rate(&self, admin_id: &str, id: &str) -> Result<Option<TaxRate>, AppError>;
    async fn list_tax_rates(&self, admin_id: &str) -> Result<Vec<TaxRate>, AppError>;
    async fn update_tax_rate(&self, rate: &TaxRate) -> Result<TaxRate, AppError>;
    async fn deactivate_tax_rate(&self, admin_id: &str, id: &str) -> Result<(), AppError>;

    async fn create_category(&self, category: &ServiceCategory) -> Result<ServiceCategory, AppError>;
    async fn find_category(&self, admin_id: &str, id: &str) -> Result<Option<ServiceCategory>, AppError>;
    async fn list_categories(&self, admin_id: &str) -> Result<Vec<ServiceCategory>, AppError>;
    async fn update_category(&self, category: &ServiceCategory) -> Result<ServiceCategory, AppError>;
    async fn deactivate_category(&self, admin_id: &str, id: &str) -> Result<(), AppError>;

    async fn create_service(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_service(&self, admin_id: &str, id: &str) -> Result<Option<Service>, AppError>;
    async fn list_services(&self, admin_id: &str) -> Result<Vec<Service>, AppError>;
    /// Includes deactivated services so bookings keep resolving theirs.
    async fn find_services_by_ids(&self, admin_id: &str, ids: &[String]) -> Result<Vec<Service>, AppError>;
    async fn update_service(&self, service: &Service) -> Result<Service, AppError>;
    async fn deactivate_service(&self, admin_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts `booking` unless a non-cancelled booking of the same admin
    /// overlaps it. The check and the write form one transaction serialized
    /// per admin.
    async fn create_if_available(&self, booking: &Booking) -> Result<Booking, AppError>;
    /// Same guarantee as `create_if_available`, ignoring the booking itself.
    async fn reschedule_if_available(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list(&self, admin_id: &str, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    async fn list_by_range(&self, admin_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    /// Writes the contact columns only.
    async fn update_contact(&self, booking: &Booking) -> Result<Booking, AppError>;
    /// Moves `current` to the status and times of `next`, provided the stored
    /// row still has the status and start of `current`. `None` means another
    /// writer got there first.
    async fn transition(&self, current: &Booking, next: &Booking) -> Result<Option<Booking>, AppError>;
    async fn set_external_event(&self, admin_id: &str, id: &str, event_id: Option<&str>, updated_at: DateTime<Utc>) -> Result<Booking, AppError>;
}

#[async_trait]
pub trait CalendarCredentialRepository: Send + Sync {
    async fn find(&self, admin_id: &str) -> Result<Option<CalendarCredential>, AppError>;
    async fn upsert(&self, credential: &CalendarCredential) -> Result<CalendarCredential, AppError>;
    async fn delete(&self, admin_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}

/// Remote calendar API. Implementations load the admin's stored credential
/// themselves and report `NotConnected` when there is none.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn list_calendars(&self, admin_id: &str) -> Result<Vec<CalendarSummary>, CalendarError>;
    async fn get_event(&self, admin_id: &str, calendar_id: &str, event_id: &str) -> Result<RemoteEvent, CalendarError>;
    async fn create_event(&self, admin_id: &str, calendar_id: &str, draft: &EventDraft) -> Result<RemoteEvent, CalendarError>;
    async fn update_event(&self, admin_id: &str, calendar_id: &str, event_id: &str, draft: &EventDraft) -> Result<RemoteEvent, CalendarError>;
    async fn delete_event(&self, admin_id: &str, calendar_id: &str, event_id: &str) -> Result<(), CalendarError>;
    /// Revokes the remote grant. Local credential cleanup is the caller's job.
    async fn revoke(&self, credential: &CalendarCredential) -> Result<(), CalendarError>;
}

/// Every persistence port of one backend, handed around as a unit.
#[derive(Clone)]
pub struct Repositories {
    pub admins: Arc<dyn AdminRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub rules: Arc<dyn AvailabilityRuleRepository>,
    pub blackouts: Arc<dyn BlackoutRepository>,
    pub settings: Arc<dyn BookingSettingsRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub calendar_credentials: Arc<dyn CalendarCredentialRepository>,
}
