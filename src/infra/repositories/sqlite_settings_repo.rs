use crate::domain::{models::settings::BookingSettings, ports::BookingSettingsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteSettingsRepo {
    pool: SqlitePool,
}

impl SqliteSettingsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingSettingsRepository for SqliteSettingsRepo {
    async fn find(&self, admin_id: &str) -> Result<Option<BookingSettings>, AppError> {
        sqlx::query_as::<_, BookingSettings>("SELECT * FROM booking_settings WHERE admin_id = ?")
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, settings: &BookingSettings) -> Result<BookingSettings, AppError> {
        sqlx::query_as::<_, BookingSettings>(
            "INSERT INTO booking_settings (admin_id, time_zone, lead_time_min, max_advance_days, default_buffer_min, slot_step_min, external_calendar_id, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(admin_id) DO UPDATE SET
                time_zone = excluded.time_zone,
                lead_time_min = excluded.lead_time_min,
                max_advance_days = excluded.max_advance_days,
                default_buffer_min = excluded.default_buffer_min,
                slot_step_min = excluded.slot_step_min,
                updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&settings.admin_id)
            .bind(&settings.time_zone)
            .bind(settings.lead_time_min)
            .bind(settings.max_advance_days)
            .bind(settings.default_buffer_min)
            .bind(settings.slot_step_min)
            .bind(&settings.external_calendar_id)
            .bind(settings.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_external_calendar(&self, admin_id: &str, calendar_id: Option<&str>) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO booking_settings (admin_id, external_calendar_id, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(admin_id) DO UPDATE SET external_calendar_id = excluded.external_calendar_id, updated_at = excluded.updated_at"
        )
            .bind(admin_id)
            .bind(calendar_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
