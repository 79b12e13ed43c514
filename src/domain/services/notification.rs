use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{info, instrument};
use crate::domain::models::{admin::Admin, booking::Booking, catalog::Service, settings::BookingSettings};
use crate::domain::ports::EmailService;
use crate::domain::services::ics::generate_ics;
use crate::error::AppError;

pub const CONFIRMATION_TEMPLATE: &str = "booking_confirmation.html";

pub struct NotificationService {
    email_service: Arc<dyn EmailService>,
    templates: Arc<Tera>,
}

impl NotificationService {
    pub fn new(email_service: Arc<dyn EmailService>, templates: Arc<Tera>) -> Self {
        Self { email_service, templates }
    }

    #[instrument(skip_all, fields(booking_id = %booking.id))]
    pub async fn send_booking_confirmation(
        &self,
        admin: &Admin,
        settings: &BookingSettings,
        booking: &Booking,
        services: &[Service],
    ) -> Result<(), AppError> {
        let start_local = booking.start_time.with_timezone(&settings.tz());
        let service_names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();

        let mut context = Context::new();
        context.insert("customer_name", &booking.customer_name);
        context.insert("admin_name", &admin.name);
        context.insert("status", &booking.status);
        context.insert("start_local", &start_local.format("%A, %d %B %Y %H:%M").to_string());
        context.insert("time_zone", &settings.time_zone);
        context.insert("services", &service_names);
        context.insert("property_address", &booking.property_address);

        let html = self.templates.render(CONFIRMATION_TEMPLATE, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Template render failed: {}", e)))?;

        let summary = format!("Appointment with {}", admin.name);
        let ics = generate_ics(booking, &summary, &service_names.join(", "));

        self.email_service.send(
            &booking.customer_email,
            &summary,
            &html,
            Some("appointment.ics"),
            Some(ics.as_bytes()),
        ).await?;

        info!("Confirmation sent to {}", booking.customer_email);
        Ok(())
    }
}

/// Loads the bundled templates. Panics at startup if they fail to parse.
pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template(CONFIRMATION_TEMPLATE, include_str!("../../templates/booking_confirmation.html"))
        .expect("Failed to load booking confirmation template");
    tera
}
