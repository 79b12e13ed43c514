use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Admin {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(slug: String, name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug,
            name,
            email,
            password_hash,
            role: "ADMIN".to_string(),
            created_at: Utc::now(),
        }
    }
}

/// The public face of an admin, safe to hand to anonymous visitors.
#[derive(Debug, Serialize, Clone)]
pub struct PublicAdmin {
    pub id: String,
    pub slug: String,
    pub name: String,
}

impl From<&Admin> for PublicAdmin {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id.clone(),
            slug: admin.slug.clone(),
            name: admin.name.clone(),
        }
    }
}
