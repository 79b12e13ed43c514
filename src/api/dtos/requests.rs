use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterAdminRequest {
    pub slug: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub slug: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub day_of_week: i32,
    pub start_minutes: i32,
    pub end_minutes: i32,
    /// Falls back to the admin's booking timezone.
    pub time_zone: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub day_of_week: Option<i32>,
    pub start_minutes: Option<i32>,
    pub end_minutes: Option<i32>,
    pub time_zone: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateBlackoutRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBlackoutRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTaxRateRequest {
    pub name: String,
    pub rate_bps: i32,
}

#[derive(Deserialize)]
pub struct UpdateTaxRateRequest {
    pub name: Option<String>,
    pub rate_bps: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub sort_order: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub category_id: String,
    pub name: String,
    pub duration_min: i32,
    pub buffer_before_min: Option<i32>,
    pub buffer_after_min: Option<i32>,
    pub price_cents: i64,
    #[serde(default)]
    pub tax_rate_ids: Vec<String>,
    pub min_sq_ft: Option<i32>,
    pub max_sq_ft: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateServiceRequest {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub duration_min: Option<i32>,
    pub buffer_before_min: Option<i32>,
    pub buffer_after_min: Option<i32>,
    pub price_cents: Option<i64>,
    pub tax_rate_ids: Option<Vec<String>>,
    pub min_sq_ft: Option<i32>,
    pub max_sq_ft: Option<i32>,
    pub active: Option<bool>,
}

/// `?start=2025-03-10&end=2025-03-16&service_ids=a,b`
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub service_ids: Option<String>,
}

impl SlotsQuery {
    pub fn service_ids(&self) -> Vec<String> {
        split_ids(self.service_ids.as_deref())
    }
}

pub fn split_ids(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub start: DateTime<Utc>,
    pub service_ids: Vec<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub property_address: Option<String>,
    pub sq_ft: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub start: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub property_address: Option<String>,
    pub sq_ft: Option<i32>,
    pub notes: Option<String>,
}

impl UpdateBookingRequest {
    pub fn touches_contact(&self) -> bool {
        self.customer_name.is_some()
            || self.customer_email.is_some()
            || self.customer_phone.is_some()
            || self.property_address.is_some()
            || self.sq_ft.is_some()
            || self.notes.is_some()
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct LinkEventRequest {
    pub event_id: String,
}

#[derive(Deserialize)]
pub struct CalendarConnectionRequest {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires.
    pub expires_in: Option<i64>,
}

#[derive(Deserialize)]
pub struct SelectCalendarRequest {
    pub calendar_id: String,
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub service_ids: Vec<String>,
    pub sq_ft: Option<i32>,
}
