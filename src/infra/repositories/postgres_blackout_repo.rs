use crate::domain::{models::availability::BlackoutDate, ports::BlackoutRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresBlackoutRepo { pool: PgPool }
impl PostgresBlackoutRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl BlackoutRepository for PostgresBlackoutRepo {
    async fn create(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError> {
        sqlx::query_as::<_, BlackoutDate>("INSERT INTO blackout_dates (id, admin_id, start_time, end_time, reason, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *")
            .bind(&blackout.id).bind(&blackout.admin_id).bind(blackout.start_time).bind(blackout.end_time).bind(&blackout.reason).bind(blackout.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates WHERE admin_id = $1 AND id = $2").bind(admin_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, admin_id: &str) -> Result<Vec<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates WHERE admin_id = $1 ORDER BY start_time ASC").bind(admin_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_range(&self, admin_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<BlackoutDate>, AppError> {
        sqlx::query_as::<_, BlackoutDate>("SELECT * FROM blackout_dates WHERE admin_id = $1 AND start_time < $2 AND end_time > $3 ORDER BY start_time ASC")
            .bind(admin_id).bind(end).bind(start).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, blackout: &BlackoutDate) -> Result<BlackoutDate, AppError> {
        sqlx::query_as::<_, BlackoutDate>("UPDATE blackout_dates SET start_time = $1, end_time = $2, reason = $3 WHERE id = $4 AND admin_id = $5 RETURNING *")
            .bind(blackout.start_time).bind(blackout.end_time).bind(&blackout.reason).bind(&blackout.id).bind(&blackout.admin_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn delete(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM blackout_dates WHERE id = $1 AND admin_id = $2").bind(id).bind(admin_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Blackout not found".into())); }
        Ok(())
    }
}
