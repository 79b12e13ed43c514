use crate::domain::{models::admin::Admin, ports::AdminRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAdminRepo { pool: PgPool }
impl PostgresAdminRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl AdminRepository for PostgresAdminRepo {
    async fn create(&self, admin: &Admin) -> Result<Admin, AppError> {
        sqlx::query_as::<_, Admin>("INSERT INTO admins (id, slug, name, email, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *")
            .bind(&admin.id).bind(&admin.slug).bind(&admin.name).bind(&admin.email).bind(&admin.password_hash).bind(&admin.role).bind(admin.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Admin>, AppError> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Admin>, AppError> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE slug = $1").bind(slug).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
