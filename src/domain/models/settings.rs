use serde::{Deserialize, Serialize};
use serde_json::Value;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use crate::error::AppError;

pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const DEFAULT_LEAD_TIME_MIN: i32 = 0;
pub const DEFAULT_MAX_ADVANCE_DAYS: i32 = 60;
pub const DEFAULT_BUFFER_MIN: i32 = 0;
pub const DEFAULT_SLOT_STEP_MIN: i32 = 30;

/// Upper bounds applied on write.
pub const MAX_LEAD_TIME_MIN: i32 = 525_600;
pub const MAX_ADVANCE_DAYS: i32 = 3650;
pub const MAX_BUFFER_MIN: i32 = 1440;
pub const MAX_SLOT_STEP_MIN: i32 = 1440;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct BookingSettings {
    pub admin_id: String,
    pub time_zone: String,
    pub lead_time_min: i32,
    pub max_advance_days: i32,
    pub default_buffer_min: i32,
    pub slot_step_min: i32,
    pub external_calendar_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl BookingSettings {
    pub fn defaults(admin_id: &str) -> Self {
        Self {
            admin_id: admin_id.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            lead_time_min: DEFAULT_LEAD_TIME_MIN,
            max_advance_days: DEFAULT_MAX_ADVANCE_DAYS,
            default_buffer_min: DEFAULT_BUFFER_MIN,
            slot_step_min: DEFAULT_SLOT_STEP_MIN,
            external_calendar_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn tz(&self) -> Tz {
        self.time_zone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Applies a settings write. Numbers are coerced rather than rejected so
    /// the stored settings always stay usable; only an unknown time zone fails.
    pub fn apply(&mut self, input: &SettingsInput) -> Result<(), AppError> {
        if let Some(tz) = &input.time_zone {
            if tz.parse::<Tz>().is_err() {
                return Err(AppError::Validation(format!("Unknown time zone: {}", tz)));
            }
            self.time_zone = tz.clone();
        }

        self.lead_time_min = coerce_non_negative(input.lead_time_min.as_ref(), DEFAULT_LEAD_TIME_MIN).min(MAX_LEAD_TIME_MIN);
        self.max_advance_days = coerce_non_negative(input.max_advance_days.as_ref(), DEFAULT_MAX_ADVANCE_DAYS).min(MAX_ADVANCE_DAYS);
        self.default_buffer_min = coerce_non_negative(input.default_buffer_min.as_ref(), DEFAULT_BUFFER_MIN).min(MAX_BUFFER_MIN);

        let step = coerce_non_negative(input.slot_step_min.as_ref(), DEFAULT_SLOT_STEP_MIN);
        self.slot_step_min = if step == 0 { DEFAULT_SLOT_STEP_MIN } else { step.min(MAX_SLOT_STEP_MIN) };

        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Raw settings payload. Numeric fields stay untyped JSON until coerced.
#[derive(Debug, Deserialize, Default)]
pub struct SettingsInput {
    pub time_zone: Option<String>,
    pub lead_time_min: Option<Value>,
    pub max_advance_days: Option<Value>,
    pub default_buffer_min: Option<Value>,
    pub slot_step_min: Option<Value>,
}

/// Absent, null, non-numeric or non-finite input falls back to `default`;
/// negatives clamp to zero and fractions truncate.
pub fn coerce_non_negative(value: Option<&Value>, default: i32) -> i32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v.trunc().clamp(0.0, i32::MAX as f64) as i32,
        _ => default,
    }
}
