use axum::{extract::State, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use crate::state::AppState;
use crate::api::extractors::auth::AdminPrincipal;
use crate::api::dtos::requests::{CalendarConnectionRequest, SelectCalendarRequest};
use crate::domain::services::calendar_service::CalendarGrant;
use crate::error::AppError;
use std::sync::Arc;

pub async fn status(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.calendar_service.connection(&principal.id).await?))
}

pub async fn list_calendars(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.calendar_service.list_calendars(&principal.id).await?))
}

pub async fn store_connection(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CalendarConnectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let grant = CalendarGrant {
        access_token: payload.access_token,
        refresh_token: payload.refresh_token,
        expires_at: payload.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
    };
    Ok(Json(state.calendar_service.connect(&principal.id, grant).await?))
}

pub async fn select_calendar(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<SelectCalendarRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.calendar_service.select_calendar(&principal.id, &payload.calendar_id).await?))
}

pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.calendar_service.disconnect(&principal.id).await?))
}
