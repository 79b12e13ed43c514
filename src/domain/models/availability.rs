use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use crate::error::AppError;

pub const MINUTES_PER_DAY: i32 = 1440;

/// A weekly recurring window. `day_of_week` counts from Sunday = 0 and the
/// minutes are local to `time_zone`.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityRule {
    pub id: String,
    pub admin_id: String,
    pub day_of_week: i32,
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub time_zone: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewRuleParams {
    pub admin_id: String,
    pub day_of_week: i32,
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub time_zone: String,
    pub active: bool,
}

impl AvailabilityRule {
    pub fn new(params: NewRuleParams) -> Result<Self, AppError> {
        validate_rule(params.day_of_week, params.start_minutes, params.end_minutes, &params.time_zone)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            admin_id: params.admin_id,
            day_of_week: params.day_of_week,
            start_minutes: params.start_minutes,
            end_minutes: params.end_minutes,
            time_zone: params.time_zone,
            active: params.active,
            created_at: Utc::now(),
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_rule(self.day_of_week, self.start_minutes, self.end_minutes, &self.time_zone)
    }
}

pub fn validate_rule(day_of_week: i32, start_minutes: i32, end_minutes: i32, time_zone: &str) -> Result<(), AppError> {
    if !(0..=6).contains(&day_of_week) {
        return Err(AppError::Validation("day_of_week must be between 0 (Sunday) and 6".into()));
    }
    if !(0..MINUTES_PER_DAY).contains(&start_minutes) {
        return Err(AppError::Validation("start_minutes must be within [0, 1440)".into()));
    }
    if end_minutes <= 0 || end_minutes > MINUTES_PER_DAY {
        return Err(AppError::Validation("end_minutes must be within (0, 1440]".into()));
    }
    if start_minutes >= end_minutes {
        return Err(AppError::Validation("start_minutes must be before end_minutes".into()));
    }
    if time_zone.parse::<Tz>().is_err() {
        return Err(AppError::Validation(format!("Unknown time zone: {}", time_zone)));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct BlackoutDate {
    pub id: String,
    pub admin_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BlackoutDate {
    pub fn new(admin_id: String, start_time: DateTime<Utc>, end_time: DateTime<Utc>, reason: Option<String>) -> Result<Self, AppError> {
        validate_blackout(start_time, end_time)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            admin_id,
            start_time,
            end_time,
            reason,
            created_at: Utc::now(),
        })
    }
}

pub fn validate_blackout(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation("Blackout start must be before its end".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params(day: i32, start: i32, end: i32, tz: &str) -> NewRuleParams {
        NewRuleParams {
            admin_id: "a".into(),
            day_of_week: day,
            start_minutes: start,
            end_minutes: end,
            time_zone: tz.into(),
            active: true,
        }
    }

    #[test]
    fn test_rule_validation() {
        assert!(AvailabilityRule::new(params(1, 540, 1020, "UTC")).is_ok());
        assert!(AvailabilityRule::new(params(0, 0, 1440, "Europe/Berlin")).is_ok());

        assert!(AvailabilityRule::new(params(1, 600, 600, "UTC")).is_err());
        assert!(AvailabilityRule::new(params(1, 700, 600, "UTC")).is_err());
        assert!(AvailabilityRule::new(params(7, 540, 600, "UTC")).is_err());
        assert!(AvailabilityRule::new(params(-1, 540, 600, "UTC")).is_err());
        assert!(AvailabilityRule::new(params(1, 540, 1441, "UTC")).is_err());
        assert!(AvailabilityRule::new(params(1, 540, 600, "Mars/Olympus")).is_err());
    }

    #[test]
    fn test_blackout_requires_positive_length() {
        let a = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap();

        assert!(BlackoutDate::new("a".into(), a, b, None).is_ok());
        assert!(BlackoutDate::new("a".into(), a, a, None).is_err());
        assert!(BlackoutDate::new("a".into(), b, a, Some("oops".into())).is_err());
    }
}
