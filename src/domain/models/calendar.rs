use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use crate::domain::models::time::local_to_utc;

/// Stored OAuth grant for an admin's external calendar.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CalendarCredential {
    pub admin_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
}

impl CalendarCredential {
    /// Tokens expiring within a minute are treated as already expired.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now + Duration::seconds(60))
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CalendarConnection {
    Disconnected,
    Connected { calendar_id: Option<String> },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalendarSummary {
    pub id: String,
    pub display_name: String,
    pub is_primary: bool,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteEventStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventTime {
    At(DateTime<Utc>),
    AllDay(NaiveDate),
}

impl EventTime {
    /// All-day values resolve to local midnight in `tz`.
    pub fn resolve(&self, tz: Tz) -> DateTime<Utc> {
        match self {
            EventTime::At(instant) => *instant,
            EventTime::AllDay(date) => local_to_utc(tz, *date, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: String,
    pub status: RemoteEventStatus,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub raw: Value,
}

/// What gets written to the remote calendar for a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
