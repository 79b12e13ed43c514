use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use crate::domain::models::{
    admin::PublicAdmin,
    availability::{AvailabilityRule, BlackoutDate},
    booking::Booking,
    catalog::{Service, ServiceCategory, TaxRate},
    settings::BookingSettings,
};

#[derive(Serialize)]
pub struct AdminCreatedResponse {
    pub admin_id: String,
    pub slug: String,
    pub admin_secret: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub time_zone: String,
    pub slots: Vec<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct DatesResponse {
    pub time_zone: String,
    pub dates: Vec<NaiveDate>,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub booking: Booking,
    pub remote_event: Value,
}

/// Settings as shown to customers. The linked calendar stays private.
#[derive(Serialize)]
pub struct PublicSettings {
    pub time_zone: String,
    pub lead_time_min: i32,
    pub max_advance_days: i32,
    pub default_buffer_min: i32,
    pub slot_step_min: i32,
}

impl From<&BookingSettings> for PublicSettings {
    fn from(s: &BookingSettings) -> Self {
        Self {
            time_zone: s.time_zone.clone(),
            lead_time_min: s.lead_time_min,
            max_advance_days: s.max_advance_days,
            default_buffer_min: s.default_buffer_min,
            slot_step_min: s.slot_step_min,
        }
    }
}

#[derive(Serialize)]
pub struct PublicRule {
    pub day_of_week: i32,
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub time_zone: String,
}

impl From<&AvailabilityRule> for PublicRule {
    fn from(r: &AvailabilityRule) -> Self {
        Self {
            day_of_week: r.day_of_week,
            start_minutes: r.start_minutes,
            end_minutes: r.end_minutes,
            time_zone: r.time_zone.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct PublicBlackout {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&BlackoutDate> for PublicBlackout {
    fn from(b: &BlackoutDate) -> Self {
        Self { start_time: b.start_time, end_time: b.end_time }
    }
}

#[derive(Serialize)]
pub struct PublicCatalogResponse {
    pub admin: PublicAdmin,
    pub settings: PublicSettings,
    pub rules: Vec<PublicRule>,
    pub blackouts: Vec<PublicBlackout>,
    pub categories: Vec<ServiceCategory>,
    pub services: Vec<Service>,
    pub tax_rates: Vec<TaxRate>,
}
