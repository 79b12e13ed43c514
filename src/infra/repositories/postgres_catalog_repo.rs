use crate::domain::{models::catalog::{Service, ServiceCategory, TaxRate}, ports::CatalogRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCatalogRepo { pool: PgPool }

impl PostgresCatalogRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    async fn deactivate(&self, table: &str, admin_id: &str, id: &str, missing: &str) -> Result<(), AppError> {
        let sql = format!("UPDATE {} SET active = FALSE WHERE id = $1 AND admin_id = $2", table);
        let result = sqlx::query(&sql).bind(id).bind(admin_id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound(missing.to_string())); }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepo {
    async fn create_tax_rate(&self, rate: &TaxRate) -> Result<TaxRate, AppError> {
        sqlx::query_as::<_, TaxRate>("INSERT INTO tax_rates (id, admin_id, name, rate_bps, active, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *")
            .bind(&rate.id).bind(&rate.admin_id).bind(&rate.name).bind(rate.rate_bps).bind(rate.active).bind(rate.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_tax_rate(&self, admin_id: &str, id: &str) -> Result<Option<TaxRate>, AppError> {
        sqlx::query_as::<_, TaxRate>("SELECT * FROM tax_rates WHERE admin_id = $1 AND id = $2").bind(admin_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_tax_rates(&self, admin_id: &str) -> Result<Vec<TaxRate>, AppError> {
        sqlx::query_as::<_, TaxRate>("SELECT * FROM tax_rates WHERE admin_id = $1 ORDER BY name ASC").bind(admin_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_tax_rate(&self, rate: &TaxRate) -> Result<TaxRate, AppError> {
        sqlx::query_as::<_, TaxRate>("UPDATE tax_rates SET name = $1, rate_bps = $2, active = $3 WHERE id = $4 AND admin_id = $5 RETURNING *")
            .bind(&rate.name).bind(rate.rate_bps).bind(rate.active).bind(&rate.id).bind(&rate.admin_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn deactivate_tax_rate(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        self.deactivate("tax_rates", admin_id, id, "Tax rate not found").await
    }

    async fn create_category(&self, category: &ServiceCategory) -> Result<ServiceCategory, AppError> {
        sqlx::query_as::<_, ServiceCategory>("INSERT INTO service_categories (id, admin_id, name, sort_order, active, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *")
            .bind(&category.id).bind(&category.admin_id).bind(&category.name).bind(category.sort_order).bind(category.active).bind(category.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_category(&self, admin_id: &str, id: &str) -> Result<Option<ServiceCategory>, AppError> {
        sqlx::query_as::<_, ServiceCategory>("SELECT * FROM service_categories WHERE admin_id = $1 AND id = $2").bind(admin_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_categories(&self, admin_id: &str) -> Result<Vec<ServiceCategory>, AppError> {
        sqlx::query_as::<_, ServiceCategory>("SELECT * FROM service_categories WHERE admin_id = $1 ORDER BY sort_order ASC, name ASC").bind(admin_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_category(&self, category: &ServiceCategory) -> Result<ServiceCategory, AppError> {
        sqlx::query_as::<_, ServiceCategory>("UPDATE service_categories SET name = $1, sort_order = $2, active = $3 WHERE id = $4 AND admin_id = $5 RETURNING *")
            .bind(&category.name).bind(category.sort_order).bind(category.active).bind(&category.id).bind(&category.admin_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn deactivate_category(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        self.deactivate("service_categories", admin_id, id, "Category not found").await
    }

    async fn create_service(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, admin_id, category_id, name, duration_min, buffer_before_min, buffer_after_min, price_cents, tax_rate_ids, min_sq_ft, max_sq_ft, active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *"
        )
            .bind(&service.id).bind(&service.admin_id).bind(&service.category_id).bind(&service.name).bind(service.duration_min)
            .bind(service.buffer_before_min).bind(service.buffer_after_min).bind(service.price_cents).bind(&service.tax_rate_ids)
            .bind(service.min_sq_ft).bind(service.max_sq_ft).bind(service.active).bind(service.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_service(&self, admin_id: &str, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE admin_id = $1 AND id = $2").bind(admin_id).bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_services(&self, admin_id: &str) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE admin_id = $1 ORDER BY name ASC").bind(admin_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_services_by_ids(&self, admin_id: &str, ids: &[String]) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE admin_id = $1 AND id = ANY($2)").bind(admin_id).bind(ids).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn update_service(&self, service: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "UPDATE services SET category_id = $1, name = $2, duration_min = $3, buffer_before_min = $4, buffer_after_min = $5, price_cents = $6,
                tax_rate_ids = $7, min_sq_ft = $8, max_sq_ft = $9, active = $10 WHERE id = $11 AND admin_id = $12 RETURNING *"
        )
            .bind(&service.category_id).bind(&service.name).bind(service.duration_min).bind(service.buffer_before_min).bind(service.buffer_after_min)
            .bind(service.price_cents).bind(&service.tax_rate_ids).bind(service.min_sq_ft).bind(service.max_sq_ft).bind(service.active)
            .bind(&service.id).bind(&service.admin_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn deactivate_service(&self, admin_id: &str, id: &str) -> Result<(), AppError> {
        self.deactivate("services", admin_id, id, "Service not found").await
    }
}
