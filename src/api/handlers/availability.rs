use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AdminPrincipal;
use crate::api::dtos::requests::{
    CreateRuleRequest, UpdateRuleRequest, CreateBlackoutRequest, UpdateBlackoutRequest,
};
use crate::domain::models::availability::{validate_blackout, AvailabilityRule, BlackoutDate, NewRuleParams};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

// --- Rules ---

pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let rules = state.repos.rules.list(&principal.id).await?;
    Ok(Json(rules))
}

pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CreateRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let time_zone = match payload.time_zone {
        Some(tz) => tz,
        None => state.booking_service.settings_for(&principal.id).await?.time_zone,
    };

    let rule = AvailabilityRule::new(NewRuleParams {
        admin_id: principal.id.clone(),
        day_of_week: payload.day_of_week,
        start_minutes: payload.start_minutes,
        end_minutes: payload.end_minutes,
        time_zone,
        active: payload.active.unwrap_or(true),
    })?;

    let created = state.repos.rules.create(&rule).await?;
    info!("Availability rule {} created for admin {}", created.id, principal.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(rule_id): Path<String>,
    Json(payload): Json<UpdateRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut rule = state.repos.rules.find_by_id(&principal.id, &rule_id).await?
        .ok_or(AppError::NotFound("Availability rule not found".into()))?;

    if let Some(val) = payload.day_of_week { rule.day_of_week = val; }
    if let Some(val) = payload.start_minutes { rule.start_minutes = val; }
    if let Some(val) = payload.end_minutes { rule.end_minutes = val; }
    if let Some(val) = payload.time_zone { rule.time_zone = val; }
    if let Some(val) = payload.active { rule.active = val; }
    rule.validate()?;

    let updated = state.repos.rules.update(&rule).await?;
    Ok(Json(updated))
}

pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(rule_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.repos.rules.delete(&principal.id, &rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Blackouts ---

pub async fn list_blackouts(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let blackouts = state.repos.blackouts.list(&principal.id).await?;
    Ok(Json(blackouts))
}

pub async fn create_blackout(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CreateBlackoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let blackout = BlackoutDate::new(principal.id.clone(), payload.start_time, payload.end_time, payload.reason)?;
    let created = state.repos.blackouts.create(&blackout).await?;

    info!("Blackout {} created for admin {}", created.id, principal.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_blackout(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(blackout_id): Path<String>,
    Json(payload): Json<UpdateBlackoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut blackout = state.repos.blackouts.find_by_id(&principal.id, &blackout_id).await?
        .ok_or(AppError::NotFound("Blackout not found".into()))?;

    if let Some(val) = payload.start_time { blackout.start_time = val; }
    if let Some(val) = payload.end_time { blackout.end_time = val; }
    if payload.reason.is_some() { blackout.reason = payload.reason; }
    validate_blackout(blackout.start_time, blackout.end_time)?;

    let updated = state.repos.blackouts.update(&blackout).await?;
    Ok(Json(updated))
}

pub async fn delete_blackout(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(blackout_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.repos.blackouts.delete(&principal.id, &blackout_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
