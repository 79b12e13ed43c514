use std::sync::Arc;
use std::time::Duration;
use tera::Tera;
use crate::config::Config;
use crate::domain::ports::{CalendarProvider, EmailService, Repositories};
use crate::domain::services::{
    auth_service::AuthService, booking_service::BookingService,
    calendar_service::CalendarService, notification::NotificationService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub repos: Repositories,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub calendar_service: Arc<CalendarService>,
}

impl AppState {
    /// Wires the domain services on top of one storage backend and the
    /// outbound adapters. Tests hand in mocks for the latter.
    pub fn new(
        config: Config,
        repos: Repositories,
        email_service: Arc<dyn EmailService>,
        calendar: Arc<dyn CalendarProvider>,
        templates: Arc<Tera>,
    ) -> Self {
        let timeout = Duration::from_secs(config.calendar_timeout_secs);
        let notifications = Arc::new(NotificationService::new(email_service, templates));

        let auth_service = Arc::new(AuthService::new(repos.auth.clone(), config.clone()));
        let booking_service = Arc::new(BookingService::new(
            repos.clone(),
            calendar.clone(),
            notifications,
            timeout,
        ));
        let calendar_service = Arc::new(CalendarService::new(
            repos.calendar_credentials.clone(),
            repos.settings.clone(),
            calendar,
            timeout,
        ));

        Self { config, repos, auth_service, booking_service, calendar_service }
    }
}
