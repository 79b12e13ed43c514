use crate::domain::{models::availability::AvailabilityRule, ports::AvailabilityRuleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresRuleRepo { pool: PgPool }
impl PostgresRuleRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl AvailabilityRuleRepository for PostgresRuleRepo {
    async fn create(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError> {
        sqlx::query_as::<_, AvailabilityRule>("INSERT INTO availability_rules (id, admin_id, day_of_week, start_minutes, end_minutes, time_zone, active, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *")
            .bind(&rule.id).bind(&rule.admin_id).bind(rule.day_of_week).bind(rule.start_minutes).bind(rule.end_minutes).bind(&rule.time_zone).bind(rule.active).bind(rule.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>("SELECT * FROM availability_rules WHERE admin_id = $1 AND id = $2").bind(admin_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, admin_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>("SELECT * FROM availability_rules WHERE admin_id = $1 ORDER BY day_of_week ASC, start_minutes ASC").bind(admin_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_active(&self, admin_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>("SELECT * FROM availability_rules WHERE admin_id = $1 AND active = TRUE ORDER BY day_of_week ASC, start_minutes ASC").bind(admin_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError> {
        sqlx::query_as::<_, AvailabilityRule>("UPDATE availability_rules SET day_of_week = $1, start_minutes = $2, end_minutes = $3, time_zone = $4, active = $5 WHERE id = $6 AND admin_id = $7 RETURNING *")
            .bind(rule.day_of_week).bind(rule.start_minutes).bind(rule.end_minutes).bind(&rule.time_zone).bind(rule.active).bind(&rule.id).bind(&rule.admin_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn delete(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_rules WHERE id = $1 AND admin_id = $2").bind(id).bind(admin_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Availability rule not found".into())); }
        Ok(())
    }
}
