use crate::domain::{models::calendar::CalendarCredential, ports::CalendarCredentialRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCalendarRepo { pool: PgPool }
impl PostgresCalendarRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl CalendarCredentialRepository for PostgresCalendarRepo {
    async fn find(&self, admin_id: &str) -> Result<Option<CalendarCredential>, AppError> {
        sqlx::query_as::<_, CalendarCredential>("SELECT * FROM calendar_credentials WHERE admin_id = $1").bind(admin_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn upsert(&self, credential: &CalendarCredential) -> Result<CalendarCredential, AppError> {
        sqlx::query_as::<_, CalendarCredential>(
            "INSERT INTO calendar_credentials (admin_id, access_token, refresh_token, expires_at, connected_at) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (admin_id) DO UPDATE SET access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, calendar_credentials.refresh_token),
                expires_at = EXCLUDED.expires_at, connected_at = EXCLUDED.connected_at
             RETURNING *"
        )
            .bind(&credential.admin_id).bind(&credential.access_token).bind(&credential.refresh_token).bind(credential.expires_at).bind(credential.connected_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn delete(&self, admin_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM calendar_credentials WHERE admin_id = $1").bind(admin_id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
