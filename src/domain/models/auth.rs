use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://booking-engine/claims/role")]
    pub role: String,

    #[serde(rename = "https://booking-engine/claims/csrf")]
    pub csrf_token: String,
}

#[derive(Debug, FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub admin_id: String,
    pub family_id: Uuid,
    pub generation_id: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub csrf_token: String,
    pub admin: AdminProfile,
}

#[derive(Serialize)]
pub struct AdminProfile {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Realtor,
    Public,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Realtor => "REALTOR",
            Role::Public => "PUBLIC",
        }
    }

    /// Unknown role strings never grant admin rights.
    pub fn parse(value: &str) -> Self {
        match value {
            "ADMIN" => Role::Admin,
            "REALTOR" => Role::Realtor,
            _ => Role::Public,
        }
    }
}

/// Who is calling. Every core booking operation receives one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: String, role: Role) -> Self {
        Self { id, role }
    }

    pub fn anonymous() -> Self {
        Self { id: String::new(), role: Role::Public }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns the id of the admin tenant this principal manages.
    pub fn admin_id(&self) -> Result<&str, AppError> {
        if self.is_admin() {
            Ok(&self.id)
        } else {
            Err(AppError::Forbidden("Admin role required".into()))
        }
    }
}
