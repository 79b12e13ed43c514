use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, types::Json};
use std::fmt;
use std::str::FromStr;
use crate::domain::models::catalog::{occupancy_minutes, Service};

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub admin_id: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub service_ids: Json<Vec<String>>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub property_address: Option<String>,
    pub sq_ft: Option<i32>,
    pub notes: Option<String>,
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub property_address: Option<String>,
    pub sq_ft: Option<i32>,
    pub notes: Option<String>,
}

pub struct NewBookingParams {
    pub admin_id: String,
    pub status: BookingStatus,
    pub start: DateTime<Utc>,
    pub occupancy_min: i64,
    pub service_ids: Vec<String>,
    pub contact: ContactInfo,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            admin_id: params.admin_id,
            status: params.status.as_str().to_string(),
            start_time: params.start,
            end_time: params.start + Duration::minutes(params.occupancy_min),
            service_ids: Json(params.service_ids),
            customer_name: params.contact.customer_name,
            customer_email: params.contact.customer_email,
            customer_phone: params.contact.customer_phone,
            property_address: params.contact.property_address,
            sq_ft: params.contact.sq_ft,
            notes: params.contact.notes,
            external_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unknown stored statuses are treated as pending.
    pub fn status(&self) -> BookingStatus {
        self.status.parse().unwrap_or(BookingStatus::Pending)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == BookingStatus::Cancelled
    }
}

/// `end = start + Σ(duration + buffers) + default buffer`, in absolute time.
pub fn booking_end(start: DateTime<Utc>, services: &[Service], default_buffer_min: i32) -> DateTime<Utc> {
    start + Duration::minutes(occupancy_minutes(services, default_buffer_min))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Forward-only lifecycle. Cancellation has its own path.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
