use crate::domain::{models::availability::BlackoutDate, ports::BlackoutRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteBlackoutRepo {
    pool: SqlitePool,
}

impl SqliteBlackoutRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlackoutRepository for SqliteBlackoutRepo {
    async fn create(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError> {
        sqlx::query_as::<_, BlackoutDate>(
            "INSERT INTO blackout_dates (id, admin_id, start_time, end_time, reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&blackout.id)
            .bind(&blackout.admin_id)
            .bind(blackout.start_time)
            .bind(blackout.end_time)
            .bind(&blackout.reason)
            .bind(blackout.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates WHERE admin_id = ? AND id = ?")
            .bind(admin_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, admin_id: &str) -> Result<Vec<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates WHERE admin_id = ? ORDER BY start_time ASC")
            .bind(admin_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_range(&self, admin_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>(
            "SELECT * FROM blackout_dates WHERE admin_id = ? AND start_time < ? AND end_time > ? ORDER BY start_time ASC"
        )
            .bind(admin_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError> {
        sqlx::query_as::<_, BlackoutDate>(
            "UPDATE blackout_dates SET start_time = ?, end_time = ?, reason = ?
             WHERE id = ? AND admin_id = ?
             RETURNING *"
        )
            .bind(blackout.start_time)
            .bind(blackout.end_time)
            .bind(&blackout.reason)
            .bind(&blackout.id)
            .bind(&blackout.admin_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM blackout_dates WHERE id = ? AND admin_id = ?")
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Blackout not found".into()));
        }
        Ok(())
    }
}
