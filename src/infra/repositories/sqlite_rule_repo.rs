use crate::domain::{models::availability::AvailabilityRule, ports::AvailabilityRuleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteRuleRepo {
    pool: SqlitePool,
}

impl SqliteRuleRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRuleRepository for SqliteRuleRepo {
    async fn create(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "INSERT INTO availability_rules (id, admin_id, day_of_week, start_minutes, end_minutes, time_zone, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&rule.id)
            .bind(&rule.admin_id)
            .bind(rule.day_of_week)
            .bind(rule.start_minutes)
            .bind(rule.end_minutes)
            .bind(&rule.time_zone)
            .bind(rule.active)
            .bind(rule.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>("SELECT * FROM availability_rules WHERE admin_id = ? AND id = ?")
            .bind(admin_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, admin_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "SELECT * FROM availability_rules WHERE admin_id = ? ORDER BY day_of_week ASC, start_minutes ASC"
        )
            .bind(admin_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_active(&self, admin_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "SELECT * FROM availability_rules WHERE admin_id = ? AND active = 1 ORDER BY day_of_week ASC, start_minutes ASC"
        )
            .bind(admin_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "UPDATE availability_rules SET day_of_week = ?, start_minutes = ?, end_minutes = ?, time_zone = ?, active = ?
             WHERE id = ? AND admin_id = ?
             RETURNING *"
        )
            .bind(rule.day_of_week)
            .bind(rule.start_minutes)
            .bind(rule.end_minutes)
            .bind(&rule.time_zone)
            .bind(rule.active)
            .bind(&rule.id)
            .bind(&rule.admin_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_rules WHERE id = ? AND admin_id = ?")
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability rule not found".into()));
        }
        Ok(())
    }
}
