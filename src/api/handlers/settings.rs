use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AdminPrincipal;
use crate::domain::models::settings::SettingsInput;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.booking_service.settings_for(&principal.id).await?;
    Ok(Json(settings))
}

/// Numeric fields are coerced rather than rejected; only the timezone can fail.
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<SettingsInput>,
) -> Result<impl IntoResponse, AppError> {
    let mut settings = state.booking_service.settings_for(&principal.id).await?;
    settings.apply(&payload)?;

    let saved = state.repos.settings.upsert(&settings).await?;
    info!("Booking settings updated for admin {}", principal.id);

    Ok(Json(saved))
}
