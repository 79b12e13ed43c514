use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::domain::models::calendar::{
    CalendarCredential, CalendarSummary, EventDraft, EventTime, RemoteEvent, RemoteEventStatus,
};
use crate::domain::ports::{CalendarCredentialRepository, CalendarProvider};
use crate::error::CalendarError;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Google Calendar v3 over REST. Access tokens are refreshed on demand and
/// written back through the credential repository.
pub struct GoogleCalendarProvider {
    client: Client,
    credentials: Arc<dyn CalendarCredentialRepository>,
    api_url: String,
    token_url: String,
    revoke_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

impl GoogleCalendarProvider {
    pub fn new(config: &Config, credentials: Arc<dyn CalendarCredentialRepository>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.calendar_timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            credentials,
            api_url: config.google_calendar_api_url.trim_end_matches('/').to_string(),
            token_url: config.google_token_url.clone(),
            revoke_url: config.google_revoke_url.clone(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CalendarError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| CalendarError::Upstream(format!("Invalid calendar API url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::Upstream("Calendar API url cannot be a base".into()))?
            .extend(segments);
        Ok(url)
    }

    async fn access_token(&self, admin_id: &str) -> Result<String, CalendarError> {
        let credential = self.credentials.find(admin_id).await
            .map_err(|e| CalendarError::Upstream(format!("Credential lookup failed: {}", e)))?
            .ok_or(CalendarError::NotConnected)?;

        if !credential.needs_refresh(Utc::now()) {
            return Ok(credential.access_token);
        }
        match credential.refresh_token.clone() {
            Some(refresh_token) => self.refresh(credential, &refresh_token).await,
            None => {
                warn!("Access token for admin {} expired and no refresh token is stored", admin_id);
                Ok(credential.access_token)
            }
        }
    }

    #[instrument(skip_all, fields(admin_id = %credential.admin_id))]
    async fn refresh(&self, credential: CalendarCredential, refresh_token: &str) -> Result<String, CalendarError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .send_with_retry(|| self.client.post(&self.token_url).form(&params))
            .await?;
        let token: TokenResponse = response.json().await
            .map_err(|e| CalendarError::Upstream(format!("Malformed token response: {}", e)))?;

        let refreshed = CalendarCredential {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(credential.refresh_token),
            expires_at: token.expires_in.map(|secs| Utc::now() + ChronoDuration::seconds(secs)),
            ..credential
        };
        self.credentials.upsert(&refreshed).await
            .map_err(|e| CalendarError::Upstream(format!("Failed to store refreshed token: {}", e)))?;

        info!("Refreshed calendar access token");
        Ok(refreshed.access_token)
    }

    /// Retries 429/5xx and network errors with doubling backoff. Any other
    /// non-success status is terminal.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, CalendarError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= MAX_RETRIES {
                            error!("Calendar API failed after {} retries. Status: {}", retries, status);
                            return Err(CalendarError::Upstream(format!("Calendar API error: {}", status)));
                        }
                        warn!("Calendar API transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        return Err(classify_status(status, response.text().await.unwrap_or_default()));
                    }
                }
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        error!("Calendar network error after {} retries: {:?}", retries, e);
                        return Err(CalendarError::Upstream(format!("Calendar network error: {}", e)));
                    }
                    warn!("Calendar network error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }

    async fn json_body(response: Response) -> Result<Value, CalendarError> {
        response.json().await
            .map_err(|e| CalendarError::Upstream(format!("Malformed calendar response: {}", e)))
    }
}

fn classify_status(status: StatusCode, body: String) -> CalendarError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => CalendarError::NotFound,
        _ => {
            error!("Calendar API terminal error {}: {}", status, body);
            CalendarError::Upstream(format!("Calendar API rejected request: {}", status))
        }
    }
}

pub fn event_body(draft: &EventDraft) -> Value {
    let mut body = json!({
        "summary": draft.summary,
        "description": draft.description,
        "start": { "dateTime": draft.start.to_rfc3339() },
        "end": { "dateTime": draft.end.to_rfc3339() },
    });
    if let Some(location) = &draft.location {
        body["location"] = json!(location);
    }
    body
}

fn parse_event_time(value: Option<&Value>) -> Option<EventTime> {
    let value = value?;
    if let Some(instant) = value.get("dateTime").and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(instant)
            .ok()
            .map(|dt| EventTime::At(dt.with_timezone(&Utc)));
    }
    value.get("date")
        .and_then(Value::as_str)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(EventTime::AllDay)
}

pub fn parse_remote_event(raw: Value) -> Result<RemoteEvent, CalendarError> {
    let id = raw.get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CalendarError::Upstream("Calendar event without id".into()))?
        .to_string();

    let status = match raw.get("status").and_then(Value::as_str) {
        Some("cancelled") => RemoteEventStatus::Cancelled,
        _ => RemoteEventStatus::Active,
    };

    Ok(RemoteEvent {
        id,
        status,
        start: parse_event_time(raw.get("start")),
        end: parse_event_time(raw.get("end")),
        raw,
    })
}

pub fn parse_calendar_list(raw: &Value) -> Vec<CalendarSummary> {
    let Some(items) = raw.get("items").and_then(Value::as_array) else {
        return vec![];
    };

    items.iter()
        .filter_map(|item| {
            let id = item.get("id")?.as_str()?.to_string();
            let display_name = item.get("summaryOverride")
                .or_else(|| item.get("summary"))
                .and_then(Value::as_str)
                .unwrap_or(id.as_str())
                .to_string();
            let is_primary = item.get("primary").and_then(Value::as_bool).unwrap_or(false);
            Some(CalendarSummary { id, display_name, is_primary })
        })
        .collect()
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    #[instrument(skip(self))]
    async fn list_calendars(&self, admin_id: &str) -> Result<Vec<CalendarSummary>, CalendarError> {
        let token = self.access_token(admin_id).await?;
        let url = self.endpoint(&["users", "me", "calendarList"])?;

        let response = self.send_with_retry(|| self.client.get(url.clone()).bearer_auth(&token)).await?;
        Ok(parse_calendar_list(&Self::json_body(response).await?))
    }

    #[instrument(skip(self))]
    async fn get_event(&self, admin_id: &str, calendar_id: &str, event_id: &str) -> Result<RemoteEvent, CalendarError> {
        let token = self.access_token(admin_id).await?;
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id])?;

        let response = self.send_with_retry(|| self.client.get(url.clone()).bearer_auth(&token)).await?;
        parse_remote_event(Self::json_body(response).await?)
    }

    #[instrument(skip(self, draft))]
    async fn create_event(&self, admin_id: &str, calendar_id: &str, draft: &EventDraft) -> Result<RemoteEvent, CalendarError> {
        let token = self.access_token(admin_id).await?;
        let url = self.endpoint(&["calendars", calendar_id, "events"])?;
        let body = event_body(draft);

        let response = self.send_with_retry(|| self.client.post(url.clone()).bearer_auth(&token).json(&body)).await?;
        let event = parse_remote_event(Self::json_body(response).await?)?;
        info!("Created calendar event {}", event.id);
        Ok(event)
    }

    #[instrument(skip(self, draft))]
    async fn update_event(&self, admin_id: &str, calendar_id: &str, event_id: &str, draft: &EventDraft) -> Result<RemoteEvent, CalendarError> {
        let token = self.access_token(admin_id).await?;
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id])?;
        let body = event_body(draft);

        let response = self.send_with_retry(|| self.client.patch(url.clone()).bearer_auth(&token).json(&body)).await?;
        parse_remote_event(Self::json_body(response).await?)
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, admin_id: &str, calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        let token = self.access_token(admin_id).await?;
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id])?;

        match self.send_with_retry(|| self.client.delete(url.clone()).bearer_auth(&token)).await {
            Ok(_) | Err(CalendarError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all, fields(admin_id = %credential.admin_id))]
    async fn revoke(&self, credential: &CalendarCredential) -> Result<(), CalendarError> {
        let token = credential.refresh_token.as_deref().unwrap_or(&credential.access_token);
        let params = [("token", token)];

        self.send_with_retry(|| self.client.post(&self.revoke_url).form(&params)).await?;
        info!("Revoked calendar grant");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timed_event() {
        let raw = json!({
            "id": "evt1",
            "status": "confirmed",
            "start": { "dateTime": "2025-03-10T10:00:00+01:00" },
            "end": { "dateTime": "2025-03-10T11:00:00+01:00" }
        });
        let event = parse_remote_event(raw.clone()).unwrap();

        assert_eq!(event.id, "evt1");
        assert_eq!(event.status, RemoteEventStatus::Active);
        assert_eq!(event.start, Some(EventTime::At(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap())));
        assert_eq!(event.raw, raw);
    }

    #[test]
    fn test_parse_all_day_and_cancelled() {
        let raw = json!({
            "id": "evt2",
            "status": "cancelled",
            "start": { "date": "2025-03-11" },
            "end": { "date": "2025-03-12" }
        });
        let event = parse_remote_event(raw).unwrap();

        assert_eq!(event.status, RemoteEventStatus::Cancelled);
        assert_eq!(event.start, Some(EventTime::AllDay(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap())));
    }

    #[test]
    fn test_event_without_id_is_upstream_error() {
        let err = parse_remote_event(json!({ "status": "confirmed" })).unwrap_err();
        assert!(matches!(err, CalendarError::Upstream(_)));
    }

    #[test]
    fn test_parse_calendar_list() {
        let raw = json!({
            "items": [
                { "id": "me@example.com", "summary": "Me", "primary": true },
                { "id": "team@group", "summary": "Team", "summaryOverride": "Field Team" },
                { "summary": "no id" }
            ]
        });
        let calendars = parse_calendar_list(&raw);

        assert_eq!(calendars.len(), 2);
        assert!(calendars[0].is_primary);
        assert_eq!(calendars[1].display_name, "Field Team");
        assert!(!calendars[1].is_primary);
        assert!(parse_calendar_list(&json!({})).is_empty());
    }

    #[test]
    fn test_event_body_shape() {
        let draft = EventDraft {
            summary: "Inspection".into(),
            description: "Photos".into(),
            location: None,
            start: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap(),
        };
        let body = event_body(&draft);

        assert_eq!(body["start"]["dateTime"], "2025-03-10T09:00:00+00:00");
        assert!(body.get("location").is_none());
    }
}
