use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::domain::models::{
    auth::Principal,
    availability::{AvailabilityRule, BlackoutDate},
    booking::{booking_end, Booking, BookingFilter, BookingStatus, ContactInfo, NewBookingParams},
    calendar::{EventDraft, RemoteEventStatus},
    catalog::{occupancy_minutes, Quote, Service},
    settings::BookingSettings,
    time::local_to_utc,
};
use crate::domain::ports::{CalendarProvider, Repositories};
use crate::domain::services::availability::{self, SlotInput};
use crate::domain::services::notification::NotificationService;
use crate::error::{AppError, CalendarError};

/// Calendar used when an admin is connected but never picked one.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Owns every mutation of an admin's booking set.
pub struct BookingService {
    repos: Repositories,
    calendar: Arc<dyn CalendarProvider>,
    notifications: Arc<NotificationService>,
    calendar_timeout: StdDuration,
}

/// Settings, rules, blackouts and bookings loaded around a time range.
struct ScheduleData {
    settings: BookingSettings,
    rules: Vec<AvailabilityRule>,
    blackouts: Vec<BlackoutDate>,
    bookings: Vec<Booking>,
}

impl ScheduleData {
    fn input(&self, occupancy_min: i64) -> SlotInput<'_> {
        SlotInput {
            settings: &self.settings,
            rules: &self.rules,
            blackouts: &self.blackouts,
            bookings: &self.bookings,
            occupancy_min,
        }
    }
}

impl BookingService {
    pub fn new(
        repos: Repositories,
        calendar: Arc<dyn CalendarProvider>,
        notifications: Arc<NotificationService>,
        calendar_timeout: StdDuration,
    ) -> Self {
        Self { repos, calendar, notifications, calendar_timeout }
    }

    /// Stored settings, or the defaults when the admin never saved any.
    pub async fn settings_for(&self, admin_id: &str) -> Result<BookingSettings, AppError> {
        Ok(self.repos.settings.find(admin_id).await?
            .unwrap_or_else(|| BookingSettings::defaults(admin_id)))
    }

    // --- Slots ---

    pub async fn slots(
        &self,
        admin_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        service_ids: &[String],
    ) -> Result<Vec<DateTime<Utc>>, AppError> {
        let settings = self.settings_for(admin_id).await?;
        let services = self.resolve_services(admin_id, service_ids, None, true).await?;
        let occupancy = occupancy_minutes(&services, settings.default_buffer_min);

        let now = Utc::now();
        let Some((first, last)) = availability::bookable_dates(&settings, start_date, end_date, now) else {
            return Ok(Vec::new());
        };

        let data = self.load_schedule(admin_id, settings, first, last).await?;
        Ok(availability::compute_available_slots(&data.input(occupancy), first, last, now))
    }

    pub async fn available_dates(
        &self,
        admin_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        service_ids: &[String],
    ) -> Result<Vec<NaiveDate>, AppError> {
        let settings = self.settings_for(admin_id).await?;
        let services = self.resolve_services(admin_id, service_ids, None, true).await?;
        let occupancy = occupancy_minutes(&services, settings.default_buffer_min);

        let now = Utc::now();
        let Some((first, last)) = availability::bookable_dates(&settings, start_date, end_date, now) else {
            return Ok(Vec::new());
        };

        let data = self.load_schedule(admin_id, settings, first, last).await?;
        Ok(availability::available_dates(&data.input(occupancy), first, last, now))
    }

    pub async fn quote(&self, admin_id: &str, service_ids: &[String], sq_ft: Option<i32>) -> Result<Quote, AppError> {
        if service_ids.is_empty() {
            return Err(AppError::Validation("At least one service is required".into()));
        }
        let settings = self.settings_for(admin_id).await?;
        let services = self.resolve_services(admin_id, service_ids, sq_ft, true).await?;
        let tax_rates = self.repos.catalog.list_tax_rates(admin_id).await?;

        Ok(Quote::compute(&services, &tax_rates, settings.default_buffer_min))
    }

    // --- Lifecycle ---

    #[instrument(skip(self, principal, contact), fields(principal_id = %principal.id))]
    pub async fn create_booking(
        &self,
        principal: &Principal,
        admin_id: &str,
        start: DateTime<Utc>,
        service_ids: &[String],
        contact: ContactInfo,
    ) -> Result<Booking, AppError> {
        if principal.is_admin() && principal.id != admin_id {
            return Err(AppError::NotFound("Admin not found".into()));
        }
        validate_contact(&contact)?;
        if service_ids.is_empty() {
            return Err(AppError::Validation("At least one service is required".into()));
        }

        let settings = self.settings_for(admin_id).await?;
        let services = self.resolve_services(admin_id, service_ids, contact.sq_ft, true).await?;
        let occupancy = occupancy_minutes(&services, settings.default_buffer_min);

        let date = start.with_timezone(&settings.tz()).date_naive();
        let data = self.load_schedule(admin_id, settings, date, date).await?;

        if !availability::is_slot_available(&data.input(occupancy), start, Utc::now()) {
            warn!("Booking rejected: {} is not an offered slot", start);
            return Err(AppError::SlotUnavailable);
        }

        let status = if principal.is_admin() { BookingStatus::Confirmed } else { BookingStatus::Pending };

        let booking = Booking::new(NewBookingParams {
            admin_id: admin_id.to_string(),
            status,
            start,
            occupancy_min: occupancy,
            service_ids: services.iter().map(|s| s.id.clone()).collect(),
            contact,
        });

        let mut created = self.repos.bookings.create_if_available(&booking).await?;
        info!("Booking created: {} ({}) for admin {}", created.id, created.status, admin_id);

        if let Some(calendar_id) = data.settings.external_calendar_id.as_deref() {
            created = self.push_to_calendar(created, calendar_id, &services).await;
        }

        self.spawn_confirmation(&data.settings, &created, services);
        Ok(created)
    }

    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn reschedule_booking(
        &self,
        principal: &Principal,
        booking_id: &str,
        new_start: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let admin_id = principal.admin_id()?;
        let mut booking = self.get_booking(principal, booking_id).await?;

        if booking.status().is_terminal() {
            return Err(AppError::InvalidTransition(format!("A {} booking cannot be rescheduled", booking.status)));
        }
        if booking.start_time == new_start {
            return Ok(booking);
        }

        let settings = self.settings_for(admin_id).await?;
        let services = self.repos.catalog.find_services_by_ids(admin_id, &booking.service_ids.0).await?;
        let occupancy = occupancy_minutes(&services, settings.default_buffer_min);

        let date = new_start.with_timezone(&settings.tz()).date_naive();
        let mut data = self.load_schedule(admin_id, settings, date, date).await?;
        data.bookings.retain(|b| b.id != booking.id);

        if !availability::is_slot_available(&data.input(occupancy), new_start, Utc::now()) {
            return Err(AppError::SlotUnavailable);
        }

        booking.start_time = new_start;
        booking.end_time = new_start + Duration::minutes(occupancy);
        booking.updated_at = Utc::now();

        let updated = self.repos.bookings.reschedule_if_available(&booking).await?;
        info!("Booking {} rescheduled to {}", updated.id, updated.start_time);

        if let (Some(calendar_id), Some(event_id)) = (data.settings.external_calendar_id.as_deref(), updated.external_event_id.as_deref()) {
            let draft = event_draft(&updated, &services);
            if let Err(e) = self.bounded(self.calendar.update_event(admin_id, calendar_id, event_id, &draft)).await {
                warn!("Failed to update remote event {} for booking {}: {}", event_id, updated.id, e);
            }
        }

        Ok(updated)
    }

    pub async fn update_contact(&self, principal: &Principal, booking_id: &str, contact: ContactInfo) -> Result<Booking, AppError> {
        let mut booking = self.get_booking(principal, booking_id).await?;
        validate_contact(&contact)?;

        booking.customer_name = contact.customer_name;
        booking.customer_email = contact.customer_email;
        booking.customer_phone = contact.customer_phone;
        booking.property_address = contact.property_address;
        booking.sq_ft = contact.sq_ft;
        booking.notes = contact.notes;
        booking.updated_at = Utc::now();

        self.repos.bookings.update_contact(&booking).await
    }

    pub async fn update_status(&self, principal: &Principal, booking_id: &str, next: BookingStatus) -> Result<Booking, AppError> {
        if next == BookingStatus::Cancelled {
            return self.cancel_booking(principal, booking_id).await;
        }

        let booking = self.get_booking(principal, booking_id).await?;
        let current = booking.status();
        if current == next {
            return Ok(booking);
        }
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!("{} -> {} is not allowed", current, next)));
        }

        let mut moved = booking.clone();
        moved.status = next.as_str().to_string();
        moved.updated_at = Utc::now();
        let updated = self.repos.bookings.transition(&booking, &moved).await?
            .ok_or_else(modified_concurrently)?;
        info!("Booking {} moved {} -> {}", updated.id, current, next);
        Ok(updated)
    }

    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn cancel_booking(&self, principal: &Principal, booking_id: &str) -> Result<Booking, AppError> {
        let admin_id = principal.admin_id()?;
        let booking = self.get_booking(principal, booking_id).await?;

        match booking.status() {
            BookingStatus::Completed => {
                return Err(AppError::InvalidTransition("A completed booking cannot be cancelled".into()));
            }
            BookingStatus::Cancelled => return Ok(booking),
            _ => {}
        }

        let mut next = booking.clone();
        next.status = BookingStatus::Cancelled.as_str().to_string();
        next.updated_at = Utc::now();
        let Some(cancelled) = self.repos.bookings.transition(&booking, &next).await? else {
            // A concurrent cancel may have won.
            let current = self.get_booking(principal, booking_id).await?;
            return match current.status() {
                BookingStatus::Cancelled => Ok(current),
                _ => Err(modified_concurrently()),
            };
        };
        info!("Booking cancelled: {}", cancelled.id);

        if let Some(event_id) = cancelled.external_event_id.as_deref() {
            let settings = self.settings_for(admin_id).await?;
            let calendar_id = settings.external_calendar_id.as_deref().unwrap_or(DEFAULT_CALENDAR_ID);
            if let Err(e) = self.bounded(self.calendar.delete_event(admin_id, calendar_id, event_id)).await {
                warn!("Failed to delete remote event {} for booking {}: {}", event_id, cancelled.id, e);
            }
        }

        Ok(cancelled)
    }

    pub async fn link_external_event(&self, principal: &Principal, booking_id: &str, event_id: &str) -> Result<Booking, AppError> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(AppError::Validation("event_id is required".into()));
        }

        let booking = self.get_booking(principal, booking_id).await?;
        if booking.external_event_id.as_deref() == Some(event_id) {
            return Ok(booking);
        }

        self.repos.bookings.set_external_event(&booking.admin_id, &booking.id, Some(event_id), Utc::now()).await
    }

    /// Pulls the linked remote event and makes it authoritative for the
    /// booking's start (and cancellation). The end is always recomputed from
    /// the booking's services, so shortened remote events never eat buffers.
    #[instrument(skip(self, principal), fields(principal_id = %principal.id))]
    pub async fn sync_from_external_calendar(&self, principal: &Principal, booking_id: &str) -> Result<(Booking, Value), AppError> {
        let admin_id = principal.admin_id()?;
        let mut booking = self.get_booking(principal, booking_id).await?;

        let event_id = booking.external_event_id.clone().ok_or(AppError::NoLinkedEvent)?;
        let settings = self.settings_for(admin_id).await?;
        let calendar_id = settings.external_calendar_id.as_deref().unwrap_or(DEFAULT_CALENDAR_ID);

        let remote = self.bounded(self.calendar.get_event(admin_id, calendar_id, &event_id)).await
            .map_err(|e| match e {
                CalendarError::NotFound => AppError::NotFound("Linked calendar event not found".into()),
                CalendarError::NotConnected => AppError::UpstreamUnavailable("calendar not connected".into()),
                CalendarError::Upstream(msg) => AppError::UpstreamUnavailable(msg),
            })?;

        let before = booking.clone();

        match remote.status {
            RemoteEventStatus::Cancelled => {
                if !booking.status().is_terminal() {
                    booking.status = BookingStatus::Cancelled.as_str().to_string();
                }
            }
            RemoteEventStatus::Active => {
                let start = remote.start
                    .map(|t| t.resolve(settings.tz()))
                    .ok_or_else(|| AppError::UpstreamUnavailable("remote event has no start".into()))?;
                let services = self.repos.catalog.find_services_by_ids(admin_id, &booking.service_ids.0).await?;

                booking.start_time = start;
                booking.end_time = booking_end(start, &services, settings.default_buffer_min);
            }
        }

        if booking.status == before.status && booking.start_time == before.start_time && booking.end_time == before.end_time {
            info!("Sync for booking {}: no changes", booking.id);
            return Ok((before, remote.raw));
        }

        booking.updated_at = Utc::now();
        let updated = self.repos.bookings.transition(&before, &booking).await?
            .ok_or_else(modified_concurrently)?;
        info!("Sync for booking {}: status {} start {} end {}", updated.id, updated.status, updated.start_time, updated.end_time);
        Ok((updated, remote.raw))
    }

    // --- Queries ---

    pub async fn get_booking(&self, principal: &Principal, booking_id: &str) -> Result<Booking, AppError> {
        let admin_id = principal.admin_id()?;
        self.repos.bookings.find_by_id(admin_id, booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }

    pub async fn list_bookings(&self, principal: &Principal, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let admin_id = principal.admin_id()?;
        if let Some(status) = &filter.status {
            status.parse::<BookingStatus>().map_err(AppError::Validation)?;
        }
        self.repos.bookings.list(admin_id, filter).await
    }

    // --- Internals ---

    /// Loads the services behind `ids` in request order. With `require_active`
    /// every service must still be offered; size limits apply when `sq_ft` is set.
    async fn resolve_services(
        &self,
        admin_id: &str,
        ids: &[String],
        sq_ft: Option<i32>,
        require_active: bool,
    ) -> Result<Vec<Service>, AppError> {
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.repos.catalog.find_services_by_ids(admin_id, &unique).await?;

        let mut services = Vec::with_capacity(unique.len());
        for id in &unique {
            let service = found.iter().find(|s| &s.id == id)
                .ok_or_else(|| AppError::Validation(format!("Unknown service: {}", id)))?;
            if require_active && !service.active {
                return Err(AppError::Validation(format!("Service is not available: {}", service.name)));
            }
            if !service.accepts_sq_ft(sq_ft) {
                return Err(AppError::Validation(format!("Property size is outside the range of {}", service.name)));
            }
            services.push(service.clone());
        }
        Ok(services)
    }

    /// Everything the slot engine needs for `[start_date, end_date]`, padded
    /// by a day on each side so rules in other zones are covered.
    async fn load_schedule(
        &self,
        admin_id: &str,
        settings: BookingSettings,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ScheduleData, AppError> {
        let tz = settings.tz();
        let before = start_date.pred_opt().unwrap_or(start_date);
        let after = end_date.max(start_date).checked_add_days(Days::new(2)).unwrap_or(NaiveDate::MAX);
        let from = local_to_utc(tz, before, 0);
        let to = local_to_utc(tz, after, 0);

        let rules = self.repos.rules.list_active(admin_id).await?;
        let blackouts = self.repos.blackouts.list_by_range(admin_id, from, to).await?;
        let bookings = self.repos.bookings.list_by_range(admin_id, from, to).await?;

        Ok(ScheduleData { settings, rules, blackouts, bookings })
    }

    async fn push_to_calendar(&self, booking: Booking, calendar_id: &str, services: &[Service]) -> Booking {
        let draft = event_draft(&booking, services);

        match self.bounded(self.calendar.create_event(&booking.admin_id, calendar_id, &draft)).await {
            Ok(event) => {
                match self.repos.bookings.set_external_event(&booking.admin_id, &booking.id, Some(event.id.as_str()), Utc::now()).await {
                    Ok(saved) => saved,
                    Err(e) => {
                        warn!("Created remote event for booking {} but failed to link it: {}", booking.id, e);
                        booking
                    }
                }
            }
            Err(e) => {
                warn!("Failed to push booking {} to calendar {}: {}", booking.id, calendar_id, e);
                booking
            }
        }
    }

    fn spawn_confirmation(&self, settings: &BookingSettings, booking: &Booking, services: Vec<Service>) {
        let admins = self.repos.admins.clone();
        let notifications = self.notifications.clone();
        let settings = settings.clone();
        let booking = booking.clone();

        tokio::spawn(async move {
            let admin = match admins.find_by_id(&booking.admin_id).await {
                Ok(Some(admin)) => admin,
                Ok(None) => return,
                Err(e) => {
                    warn!("Confirmation for booking {} skipped: {}", booking.id, e);
                    return;
                }
            };
            if let Err(e) = notifications.send_booking_confirmation(&admin, &settings, &booking, &services).await {
                warn!("Confirmation email for booking {} failed: {}", booking.id, e);
            }
        });
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, CalendarError>>) -> Result<T, CalendarError> {
        match tokio::time::timeout(self.calendar_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CalendarError::Upstream("calendar request timed out".into())),
        }
    }
}

fn modified_concurrently() -> AppError {
    AppError::InvalidTransition("Booking was modified concurrently".into())
}

fn validate_contact(contact: &ContactInfo) -> Result<(), AppError> {
    if contact.customer_name.trim().is_empty() {
        return Err(AppError::Validation("customer_name is required".into()));
    }
    let email = contact.customer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid customer_email is required".into()));
    }
    if contact.sq_ft.is_some_and(|s| s < 0) {
        return Err(AppError::Validation("sq_ft must not be negative".into()));
    }
    Ok(())
}

fn event_draft(booking: &Booking, services: &[Service]) -> EventDraft {
    let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
    let mut description = format!("Customer: {} <{}>", booking.customer_name, booking.customer_email);
    if let Some(phone) = &booking.customer_phone {
        description.push_str(&format!("\nPhone: {}", phone));
    }
    if let Some(notes) = &booking.notes {
        description.push_str(&format!("\nNotes: {}", notes));
    }

    EventDraft {
        summary: format!("{} - {}", names.join(", "), booking.customer_name),
        description,
        location: booking.property_address.clone(),
        start: booking.start_time,
        end: booking.end_time,
    }
}
