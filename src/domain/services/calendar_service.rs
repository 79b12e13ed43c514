use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::models::calendar::{CalendarConnection, CalendarCredential, CalendarSummary};
use crate::domain::ports::{BookingSettingsRepository, CalendarCredentialRepository, CalendarProvider};
use crate::error::{AppError, CalendarError};

/// OAuth grant as handed over by the connect flow.
pub struct CalendarGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Connection state of an admin's external calendar. The remote API itself
/// sits behind `CalendarProvider`.
pub struct CalendarService {
    credentials: Arc<dyn CalendarCredentialRepository>,
    settings: Arc<dyn BookingSettingsRepository>,
    provider: Arc<dyn CalendarProvider>,
    timeout: StdDuration,
}

impl CalendarService {
    pub fn new(
        credentials: Arc<dyn CalendarCredentialRepository>,
        settings: Arc<dyn BookingSettingsRepository>,
        provider: Arc<dyn CalendarProvider>,
        timeout: StdDuration,
    ) -> Self {
        Self { credentials, settings, provider, timeout }
    }

    pub async fn connection(&self, admin_id: &str) -> Result<CalendarConnection, AppError> {
        if self.credentials.find(admin_id).await?.is_none() {
            return Ok(CalendarConnection::Disconnected);
        }
        let calendar_id = self.settings.find(admin_id).await?
            .and_then(|s| s.external_calendar_id);
        Ok(CalendarConnection::Connected { calendar_id })
    }

    pub async fn connect(&self, admin_id: &str, grant: CalendarGrant) -> Result<CalendarConnection, AppError> {
        if grant.access_token.trim().is_empty() {
            return Err(AppError::Validation("access_token is required".into()));
        }

        let credential = CalendarCredential {
            admin_id: admin_id.to_string(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            connected_at: Utc::now(),
        };
        self.credentials.upsert(&credential).await?;
        info!("Calendar connected for admin {}", admin_id);

        self.connection(admin_id).await
    }

    pub async fn list_calendars(&self, admin_id: &str) -> Result<Vec<CalendarSummary>, AppError> {
        Ok(self.bounded(self.provider.list_calendars(admin_id)).await?)
    }

    /// Points new bookings at `calendar_id`, which must be one of the admin's calendars.
    pub async fn select_calendar(&self, admin_id: &str, calendar_id: &str) -> Result<CalendarConnection, AppError> {
        let calendars = self.list_calendars(admin_id).await?;
        if !calendars.iter().any(|c| c.id == calendar_id) {
            return Err(AppError::Validation(format!("Unknown calendar: {}", calendar_id)));
        }

        self.settings.set_external_calendar(admin_id, Some(calendar_id)).await?;
        info!("Admin {} selected calendar {}", admin_id, calendar_id);
        self.connection(admin_id).await
    }

    /// Revokes the grant remotely (best effort), then forgets it locally
    /// together with the selected calendar.
    pub async fn disconnect(&self, admin_id: &str) -> Result<CalendarConnection, AppError> {
        if let Some(credential) = self.credentials.find(admin_id).await? {
            if let Err(e) = self.bounded(self.provider.revoke(&credential)).await {
                warn!("Revoking calendar grant for admin {} failed: {}", admin_id, e);
            }
            self.credentials.delete(admin_id).await?;
        }

        self.settings.set_external_calendar(admin_id, None).await?;
        info!("Calendar disconnected for admin {}", admin_id);
        Ok(CalendarConnection::Disconnected)
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, CalendarError>>) -> Result<T, CalendarError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CalendarError::Upstream("calendar request timed out".into())),
        }
    }
}
