use crate::domain::{models::settings::BookingSettings, ports::BookingSettingsRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresSettingsRepo { pool: PgPool }
impl PostgresSettingsRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl BookingSettingsRepository for PostgresSettingsRepo {
    async fn find(&self, admin_id: &str) -> Result<Option<BookingSettings>, AppError> {
        sqlx::query_as::<_, BookingSettings>("SELECT * FROM booking_settings WHERE admin_id = $1").bind(admin_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn upsert(&self, settings: &BookingSettings) -> Result<BookingSettings, AppError> {
        sqlx::query_as::<_, BookingSettings>(
            "INSERT INTO booking_settings (admin_id, time_zone, lead_time_min, max_advance_days, default_buffer_min, slot_step_min, external_calendar_id, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (admin_id) DO UPDATE SET time_zone = EXCLUDED.time_zone, lead_time_min = EXCLUDED.lead_time_min, max_advance_days = EXCLUDED.max_advance_days,
                default_buffer_min = EXCLUDED.default_buffer_min, slot_step_min = EXCLUDED.slot_step_min, updated_at = EXCLUDED.updated_at
             RETURNING *"
        )
            .bind(&settings.admin_id).bind(&settings.time_zone).bind(settings.lead_time_min).bind(settings.max_advance_days)
            .bind(settings.default_buffer_min).bind(settings.slot_step_min).bind(&settings.external_calendar_id).bind(settings.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn set_external_calendar(&self, admin_id: &str, calendar_id: Option<&str>) -> Result<(), AppError> {
        sqlx::query("INSERT INTO booking_settings (admin_id, external_calendar_id, updated_at) VALUES ($1, $2, $3) ON CONFLICT (admin_id) DO UPDATE SET external_calendar_id = EXCLUDED.external_calendar_id, updated_at = EXCLUDED.updated_at")
            .bind(admin_id).bind(calendar_id).bind(Utc::now())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
