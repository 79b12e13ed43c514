use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use sqlx::types::Json as JsonColumn;
use crate::state::AppState;
use crate::api::extractors::auth::AdminPrincipal;
use crate::api::dtos::requests::{
    CreateTaxRateRequest, UpdateTaxRateRequest, CreateCategoryRequest, UpdateCategoryRequest,
    CreateServiceRequest, UpdateServiceRequest,
};
use crate::domain::models::catalog::{NewServiceParams, Service, ServiceCategory, TaxRate};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

fn require_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    Ok(trimmed.to_string())
}

/// The category and every tax rate a service points at must be the admin's own.
async fn check_service_refs(state: &AppState, admin_id: &str, service: &Service) -> Result<(), AppError> {
    if state.repos.catalog.find_category(admin_id, &service.category_id).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown category: {}", service.category_id)));
    }
    for rate_id in service.tax_rate_ids.iter() {
        if state.repos.catalog.find_tax_rate(admin_id, rate_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown tax rate: {}", rate_id)));
        }
    }
    Ok(())
}

// --- Tax rates ---

pub async fn list_tax_rates(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.repos.catalog.list_tax_rates(&principal.id).await?))
}

pub async fn create_tax_rate(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CreateTaxRateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rate = TaxRate::new(principal.id.clone(), require_name(&payload.name)?, payload.rate_bps)?;
    let created = state.repos.catalog.create_tax_rate(&rate).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_tax_rate(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(rate_id): Path<String>,
    Json(payload): Json<UpdateTaxRateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut rate = state.repos.catalog.find_tax_rate(&principal.id, &rate_id).await?
        .ok_or(AppError::NotFound("Tax rate not found".into()))?;

    if let Some(val) = payload.name { rate.name = require_name(&val)?; }
    if let Some(val) = payload.rate_bps {
        if val < 0 {
            return Err(AppError::Validation("rate_bps must not be negative".into()));
        }
        rate.rate_bps = val;
    }
    if let Some(val) = payload.active { rate.active = val; }

    Ok(Json(state.repos.catalog.update_tax_rate(&rate).await?))
}

pub async fn delete_tax_rate(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(rate_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.repos.catalog.deactivate_tax_rate(&principal.id, &rate_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Categories ---

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.repos.catalog.list_categories(&principal.id).await?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = ServiceCategory::new(principal.id.clone(), require_name(&payload.name)?, payload.sort_order.unwrap_or(0));
    let created = state.repos.catalog.create_category(&category).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(category_id): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut category = state.repos.catalog.find_category(&principal.id, &category_id).await?
        .ok_or(AppError::NotFound("Category not found".into()))?;

    if let Some(val) = payload.name { category.name = require_name(&val)?; }
    if let Some(val) = payload.sort_order { category.sort_order = val; }
    if let Some(val) = payload.active { category.active = val; }

    Ok(Json(state.repos.catalog.update_category(&category).await?))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.repos.catalog.deactivate_category(&principal.id, &category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Services ---

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.repos.catalog.list_services(&principal.id).await?))
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = Service::new(NewServiceParams {
        admin_id: principal.id.clone(),
        category_id: payload.category_id,
        name: payload.name.trim().to_string(),
        duration_min: payload.duration_min,
        buffer_before_min: payload.buffer_before_min.unwrap_or(0),
        buffer_after_min: payload.buffer_after_min.unwrap_or(0),
        price_cents: payload.price_cents,
        tax_rate_ids: payload.tax_rate_ids,
        min_sq_ft: payload.min_sq_ft,
        max_sq_ft: payload.max_sq_ft,
    })?;
    check_service_refs(&state, &principal.id, &service).await?;

    let created = state.repos.catalog.create_service(&service).await?;
    info!("Service {} created for admin {}", created.id, principal.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_service(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(service_id): Path<String>,
    Json(payload): Json<UpdateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut service = state.repos.catalog.find_service(&principal.id, &service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;

    if let Some(val) = payload.category_id { service.category_id = val; }
    if let Some(val) = payload.name { service.name = val.trim().to_string(); }
    if let Some(val) = payload.duration_min { service.duration_min = val; }
    if let Some(val) = payload.buffer_before_min { service.buffer_before_min = val; }
    if let Some(val) = payload.buffer_after_min { service.buffer_after_min = val; }
    if let Some(val) = payload.price_cents { service.price_cents = val; }
    if let Some(val) = payload.tax_rate_ids { service.tax_rate_ids = JsonColumn(val); }
    if payload.min_sq_ft.is_some() { service.min_sq_ft = payload.min_sq_ft; }
    if payload.max_sq_ft.is_some() { service.max_sq_ft = payload.max_sq_ft; }
    if let Some(val) = payload.active { service.active = val; }

    service.validate()?;
    check_service_refs(&state, &principal.id, &service).await?;

    Ok(Json(state.repos.catalog.update_service(&service).await?))
}

pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(service_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.repos.catalog.deactivate_service(&principal.id, &service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
