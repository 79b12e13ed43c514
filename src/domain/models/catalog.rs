use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, types::Json};
use std::collections::HashMap;
use crate::error::AppError;

/// Longest a single service or one of its buffers may run, in minutes.
pub const MAX_SERVICE_MINUTES: i32 = 1440;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TaxRate {
    pub id: String,
    pub admin_id: String,
    pub name: String,
    pub rate_bps: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TaxRate {
    pub fn new(admin_id: String, name: String, rate_bps: i32) -> Result<Self, AppError> {
        if rate_bps < 0 {
            return Err(AppError::Validation("rate_bps must not be negative".into()));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            admin_id,
            name,
            rate_bps,
            active: true,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ServiceCategory {
    pub id: String,
    pub admin_id: String,
    pub name: String,
    pub sort_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl ServiceCategory {
    pub fn new(admin_id: String, name: String, sort_order: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            admin_id,
            name,
            sort_order,
            active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Service {
    pub id: String,
    pub admin_id: String,
    pub category_id: String,
    pub name: String,
    pub duration_min: i32,
    pub buffer_before_min: i32,
    pub buffer_after_min: i32,
    pub price_cents: i64,
    pub tax_rate_ids: Json<Vec<String>>,
    pub min_sq_ft: Option<i32>,
    pub max_sq_ft: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewServiceParams {
    pub admin_id: String,
    pub category_id: String,
    pub name: String,
    pub duration_min: i32,
    pub buffer_before_min: i32,
    pub buffer_after_min: i32,
    pub price_cents: i64,
    pub tax_rate_ids: Vec<String>,
    pub min_sq_ft: Option<i32>,
    pub max_sq_ft: Option<i32>,
}

impl Service {
    pub fn new(params: NewServiceParams) -> Result<Self, AppError> {
        let service = Self {
            id: Uuid::new_v4().to_string(),
            admin_id: params.admin_id,
            category_id: params.category_id,
            name: params.name,
            duration_min: params.duration_min,
            buffer_before_min: params.buffer_before_min,
            buffer_after_min: params.buffer_after_min,
            price_cents: params.price_cents,
            tax_rate_ids: Json(params.tax_rate_ids),
            min_sq_ft: params.min_sq_ft,
            max_sq_ft: params.max_sq_ft,
            active: true,
            created_at: Utc::now(),
        };
        service.validate()?;
        Ok(service)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Service name is required".into()));
        }
        if self.duration_min <= 0 || self.duration_min > MAX_SERVICE_MINUTES {
            return Err(AppError::Validation(format!("duration_min must be between 1 and {}", MAX_SERVICE_MINUTES)));
        }
        let buffers = [self.buffer_before_min, self.buffer_after_min];
        if buffers.iter().any(|b| !(0..=MAX_SERVICE_MINUTES).contains(b)) {
            return Err(AppError::Validation(format!("Buffers must be between 0 and {}", MAX_SERVICE_MINUTES)));
        }
        if self.price_cents < 0 {
            return Err(AppError::Validation("price_cents must not be negative".into()));
        }
        if let (Some(min), Some(max)) = (self.min_sq_ft, self.max_sq_ft)
            && min > max {
            return Err(AppError::Validation("min_sq_ft must not exceed max_sq_ft".into()));
        }
        Ok(())
    }

    /// Minutes this service blocks on the calendar, buffers included.
    pub fn occupancy_min(&self) -> i64 {
        self.duration_min as i64 + self.buffer_before_min as i64 + self.buffer_after_min as i64
    }

    pub fn accepts_sq_ft(&self, sq_ft: Option<i32>) -> bool {
        let Some(size) = sq_ft else { return true };
        self.min_sq_ft.is_none_or(|min| size >= min) && self.max_sq_ft.is_none_or(|max| size <= max)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TaxLine {
    pub tax_rate_id: String,
    pub name: String,
    pub rate_bps: i32,
    pub amount_cents: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Quote {
    pub service_ids: Vec<String>,
    pub subtotal_cents: i64,
    pub taxes: Vec<TaxLine>,
    pub total_cents: i64,
    pub occupancy_min: i64,
}

impl Quote {
    /// Taxes are grouped per rate over the services that carry it and rounded
    /// half-up to whole cents. Inactive or unknown rates are ignored.
    pub fn compute(services: &[Service], tax_rates: &[TaxRate], default_buffer_min: i32) -> Self {
        let subtotal_cents = services.iter().map(|s| s.price_cents).sum();

        let mut taxable: HashMap<&str, i64> = HashMap::new();
        for service in services {
            for rate_id in service.tax_rate_ids.0.iter() {
                *taxable.entry(rate_id.as_str()).or_default() += service.price_cents;
            }
        }

        let taxes: Vec<TaxLine> = tax_rates.iter()
            .filter(|rate| rate.active)
            .filter_map(|rate| {
                let base = *taxable.get(rate.id.as_str())?;
                Some(TaxLine {
                    tax_rate_id: rate.id.clone(),
                    name: rate.name.clone(),
                    rate_bps: rate.rate_bps,
                    amount_cents: (base * rate.rate_bps as i64 + 5_000) / 10_000,
                })
            })
            .collect();

        let tax_total: i64 = taxes.iter().map(|t| t.amount_cents).sum();

        Self {
            service_ids: services.iter().map(|s| s.id.clone()).collect(),
            subtotal_cents,
            taxes,
            total_cents: subtotal_cents + tax_total,
            occupancy_min: occupancy_minutes(services, default_buffer_min),
        }
    }
}

/// Total minutes a booking of `services` blocks: every service's duration and
/// both buffers, plus the admin's default buffer once.
pub fn occupancy_minutes(services: &[Service], default_buffer_min: i32) -> i64 {
    services.iter().map(Service::occupancy_min).sum::<i64>() + default_buffer_min.max(0) as i64
}
