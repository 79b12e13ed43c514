use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AdminPrincipal;
use crate::api::dtos::{
    requests::{CreateBookingRequest, LinkEventRequest, SlotsQuery, UpdateBookingRequest, UpdateStatusRequest},
    responses::{SlotsResponse, SyncResponse},
};
use crate::domain::models::booking::{BookingFilter, BookingStatus, ContactInfo};
use crate::error::AppError;
use std::sync::Arc;

/// Same computation customers see, for the admin's own preview.
pub async fn preview_slots(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.booking_service.settings_for(&principal.id).await?;
    let slots = state.booking_service
        .slots(&principal.id, query.start, query.end, &query.service_ids())
        .await?;

    Ok(Json(SlotsResponse { time_zone: settings.time_zone, slots }))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Query(filter): Query<BookingFilter>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service.list_bookings(&principal, &filter).await?;
    Ok(Json(bookings))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin_id = principal.id.clone();
    let booking = state.booking_service
        .create_booking(&principal, &admin_id, payload.start, &payload.service_ids, contact_from(&payload))
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.get_booking(&principal, &booking_id).await?))
}

/// Reschedules when `start` is given and merges any contact fields.
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut booking = state.booking_service.get_booking(&principal, &booking_id).await?;

    if let Some(start) = payload.start {
        booking = state.booking_service.reschedule_booking(&principal, &booking_id, start).await?;
    }

    if payload.touches_contact() {
        let contact = ContactInfo {
            customer_name: payload.customer_name.unwrap_or(booking.customer_name),
            customer_email: payload.customer_email.unwrap_or(booking.customer_email),
            customer_phone: payload.customer_phone.or(booking.customer_phone),
            property_address: payload.property_address.or(booking.property_address),
            sq_ft: payload.sq_ft.or(booking.sq_ft),
            notes: payload.notes.or(booking.notes),
        };
        booking = state.booking_service.update_contact(&principal, &booking_id, contact).await?;
    }

    Ok(Json(booking))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let next: BookingStatus = payload.status.parse().map_err(AppError::Validation)?;
    Ok(Json(state.booking_service.update_status(&principal, &booking_id, next).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.cancel_booking(&principal, &booking_id).await?))
}

pub async fn link_event(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(booking_id): Path<String>,
    Json(payload): Json<LinkEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_service.link_external_event(&principal, &booking_id, &payload.event_id).await?))
}

pub async fn sync_from_google(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (booking, remote_event) = state.booking_service
        .sync_from_external_calendar(&principal, &booking_id)
        .await?;

    Ok(Json(SyncResponse { booking, remote_event }))
}

pub fn contact_from(payload: &CreateBookingRequest) -> ContactInfo {
    ContactInfo {
        customer_name: payload.customer_name.clone(),
        customer_email: payload.customer_email.clone(),
        customer_phone: payload.customer_phone.clone(),
        property_address: payload.property_address.clone(),
        sq_ft: payload.sq_ft,
        notes: payload.notes.clone(),
    }
}
