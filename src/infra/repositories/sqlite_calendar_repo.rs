use crate::domain::{models::calendar::CalendarCredential, ports::CalendarCredentialRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteCalendarRepo {
    pool: SqlitePool,
}

impl SqliteCalendarRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarCredentialRepository for SqliteCalendarRepo {
    async fn find(&self, admin_id: &str) -> Result<Option<CalendarCredential>, AppError> {
        sqlx::query_as::<_, CalendarCredential>("SELECT * FROM calendar_credentials WHERE admin_id = ?")
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn upsert(&self, credential: &CalendarCredential) -> Result<CalendarCredential, AppError> {
        sqlx::query_as::<_, CalendarCredential>(
            "INSERT INTO calendar_credentials (admin_id, access_token, refresh_token, expires_at, connected_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(admin_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = COALESCE(excluded.refresh_token, calendar_credentials.refresh_token),
                expires_at = excluded.expires_at,
                connected_at = excluded.connected_at
             RETURNING *"
        )
            .bind(&credential.admin_id)
            .bind(&credential.access_token)
            .bind(&credential.refresh_token)
            .bind(credential.expires_at)
            .bind(credential.connected_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, admin_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM calendar_credentials WHERE admin_id = ?")
            .bind(admin_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
