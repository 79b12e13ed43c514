use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::RegisterAdminRequest, responses::AdminCreatedResponse};
use crate::domain::models::admin::Admin;
use crate::error::AppError;
use std::sync::Arc;
use rand::{distributions::Alphanumeric, Rng};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use tracing::info;

/// Registers an admin and hands back a generated secret, shown only once.
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    let slug = payload.slug.trim().to_lowercase();
    if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppError::Validation("slug must be non-empty and contain only letters, digits and '-'".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if !payload.email.contains('@') {
        return Err(AppError::Validation("email is invalid".into()));
    }

    let admin_secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();

    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(admin_secret.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string();

    let admin = Admin::new(slug, payload.name.trim().to_string(), payload.email.trim().to_string(), password_hash);
    let created = state.repos.admins.create(&admin).await?;

    info!("Admin registered: {} ({})", created.id, created.slug);

    Ok((StatusCode::CREATED, Json(AdminCreatedResponse {
        admin_id: created.id,
        slug: created.slug,
        admin_secret,
    })))
}
