use axum::{extract::{State, Query}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use crate::state::AppState;
use crate::api::extractors::{admin_ref::AdminRef, maybe_auth::MaybePrincipal};
use crate::api::dtos::{
    requests::{CreateBookingRequest, QuoteRequest, SlotsQuery},
    responses::{DatesResponse, PublicBlackout, PublicCatalogResponse, PublicRule, PublicSettings, SlotsResponse},
};
use crate::api::handlers::booking::contact_from;
use crate::domain::models::{admin::PublicAdmin, auth::Principal};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Everything a booking page needs, restricted to active records.
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    AdminRef(admin): AdminRef,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.booking_service.settings_for(&admin.id).await?;
    let rules = state.repos.rules.list_active(&admin.id).await?;

    let now = Utc::now();
    let blackouts = state.repos.blackouts.list(&admin.id).await?
        .into_iter()
        .filter(|b| b.end_time > now)
        .collect::<Vec<_>>();

    let categories = state.repos.catalog.list_categories(&admin.id).await?
        .into_iter()
        .filter(|c| c.active)
        .collect::<Vec<_>>();
    let services = state.repos.catalog.list_services(&admin.id).await?
        .into_iter()
        .filter(|s| s.active && categories.iter().any(|c| c.id == s.category_id))
        .collect();
    let tax_rates = state.repos.catalog.list_tax_rates(&admin.id).await?
        .into_iter()
        .filter(|t| t.active)
        .collect();

    Ok(Json(PublicCatalogResponse {
        admin: PublicAdmin::from(&admin),
        settings: PublicSettings::from(&settings),
        rules: rules.iter().map(PublicRule::from).collect(),
        blackouts: blackouts.iter().map(PublicBlackout::from).collect(),
        categories,
        services,
        tax_rates,
    }))
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    AdminRef(admin): AdminRef,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.booking_service.settings_for(&admin.id).await?;
    let slots = state.booking_service
        .slots(&admin.id, query.start, query.end, &query.service_ids())
        .await?;

    Ok(Json(SlotsResponse { time_zone: settings.time_zone, slots }))
}

pub async fn get_dates(
    State(state): State<Arc<AppState>>,
    AdminRef(admin): AdminRef,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.booking_service.settings_for(&admin.id).await?;
    let dates = state.booking_service
        .available_dates(&admin.id, query.start, query.end, &query.service_ids())
        .await?;

    Ok(Json(DatesResponse { time_zone: settings.time_zone, dates }))
}

pub async fn quote(
    State(state): State<Arc<AppState>>,
    AdminRef(admin): AdminRef,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.quote(&admin.id, &payload.service_ids, payload.sq_ft).await?))
}

/// Customer booking request. A logged-in admin booking on their own page
/// gets an immediately confirmed booking.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AdminRef(admin): AdminRef,
    MaybePrincipal(caller): MaybePrincipal,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = if caller.is_admin() && caller.id == admin.id {
        caller
    } else {
        Principal::anonymous()
    };

    let booking = state.booking_service
        .create_booking(&principal, &admin.id, payload.start, &payload.service_ids, contact_from(&payload))
        .await?;

    info!("Public booking {} created for admin {}", booking.id, admin.slug);
    Ok((StatusCode::CREATED, Json(booking)))
}
