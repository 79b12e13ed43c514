use crate::domain::models::booking::Booking;
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};

/// Generates an iCalendar (.ics) string for a booking
pub fn generate_ics(booking: &Booking, summary: &str, description: &str) -> String {
    let mut calendar = Calendar::new();

    let mut ical_event = IcalEvent::new();
    ical_event
        .summary(summary)
        .description(description)
        .starts(booking.start_time)
        .ends(booking.end_time)
        .uid(&booking.id);

    if let Some(address) = &booking.property_address {
        ical_event.location(address);
    }

    calendar.push(ical_event.done());
    calendar.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::booking::{BookingStatus, ContactInfo, NewBookingParams};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_ics_contains_booking_window() {
        let booking = Booking::new(NewBookingParams {
            admin_id: "a".into(),
            status: BookingStatus::Confirmed,
            start: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            occupancy_min: 90,
            service_ids: vec![],
            contact: ContactInfo {
                property_address: Some("1 Main St".into()),
                ..Default::default()
            },
        });

        let ics = generate_ics(&booking, "Photo shoot", "Interior photos");

        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("SUMMARY:Photo shoot"));
        assert!(ics.contains("20250310T090000Z"));
        assert!(ics.contains("20250310T103000Z"));
        assert!(ics.contains(&booking.id));
        assert!(ics.contains("LOCATION:1 Main St"));
    }
}
