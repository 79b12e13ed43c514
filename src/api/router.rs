use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, patch},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, availability, booking, calendar, catalog, health, public, settings};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Admins & Auth
        .route("/api/v1/admins", post(admin::register_admin))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Availability
        .route("/api/v1/admin/availability/rules", get(availability::list_rules).post(availability::create_rule))
        .route("/api/v1/admin/availability/rules/{id}", patch(availability::update_rule).delete(availability::delete_rule))
        .route("/api/v1/admin/availability/blackouts", get(availability::list_blackouts).post(availability::create_blackout))
        .route("/api/v1/admin/availability/blackouts/{id}", patch(availability::update_blackout).delete(availability::delete_blackout))
        .route("/api/v1/admin/booking-settings", get(settings::get_settings).put(settings::put_settings))

        // Catalog
        .route("/api/v1/admin/tax-rates", get(catalog::list_tax_rates).post(catalog::create_tax_rate))
        .route("/api/v1/admin/tax-rates/{id}", patch(catalog::update_tax_rate).delete(catalog::delete_tax_rate))
        .route("/api/v1/admin/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/api/v1/admin/categories/{id}", patch(catalog::update_category).delete(catalog::delete_category))
        .route("/api/v1/admin/services", get(catalog::list_services).post(catalog::create_service))
        .route("/api/v1/admin/services/{id}", patch(catalog::update_service).delete(catalog::delete_service))

        // Admin Bookings
        .route("/api/v1/admin/slots", get(booking::preview_slots))
        .route("/api/v1/admin/bookings", get(booking::list_bookings).post(booking::create_booking))
        .route("/api/v1/admin/bookings/{id}", get(booking::get_booking).patch(booking::update_booking))
        .route("/api/v1/admin/bookings/{id}/status", post(booking::update_status))
        .route("/api/v1/admin/bookings/{id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/admin/bookings/{id}/link-event", post(booking::link_event))
        .route("/api/v1/admin/bookings/{id}/sync-from-google", post(booking::sync_from_google))

        // External Calendar
        .route("/api/v1/admin/calendar/status", get(calendar::status))
        .route("/api/v1/admin/calendar/calendars", get(calendar::list_calendars))
        .route("/api/v1/admin/calendar/connection", put(calendar::store_connection))
        .route("/api/v1/admin/calendar/select", post(calendar::select_calendar))
        .route("/api/v1/admin/calendar/disconnect", post(calendar::disconnect))

        // Public Booking Flow
        .route("/api/v1/public/{admin}/catalog", get(public::get_catalog))
        .route("/api/v1/public/{admin}/slots", get(public::get_slots))
        .route("/api/v1/public/{admin}/dates", get(public::get_dates))
        .route("/api/v1/public/{admin}/quote", post(public::quote))
        .route("/api/v1/public/{admin}/bookings", post(public::create_booking))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        admin_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
