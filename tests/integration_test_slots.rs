mod common;

use common::{at, next_monday, parse_body, TestApp};
use chrono::Duration;
use serde_json::{json, Value};

fn slot_strings(body: &Value) -> Vec<String> {
    body["slots"].as_array().unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_slots_cover_the_rule_window() {
    let app = TestApp::new().await;
    let auth = app.admin("slots-basic").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let uri = format!("/api/v1/public/slots-basic/slots?start={}&end={}&service_ids={}", monday, monday, service_id);
    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), 200);
    let body = parse_body(res).await;
    assert_eq!(body["time_zone"], "UTC");

    let slots = slot_strings(&body);
    assert_eq!(slots.len(), 15, "09:00 to 16:00 every 30 minutes");
    assert_eq!(slots.first().unwrap(), &at(monday, "09:00"));
    assert_eq!(slots.last().unwrap(), &at(monday, "16:00"));

    // The admin preview computes the same thing.
    let uri = format!("/api/v1/admin/slots?start={}&end={}&service_ids={}", monday, monday, service_id);
    let res = app.request("GET", &uri, Some(&auth), None).await;
    assert_eq!(slot_strings(&parse_body(res).await), slots);
}

#[tokio::test]
async fn test_admin_can_be_addressed_by_id_or_slug() {
    let app = TestApp::new().await;
    let auth = app.admin("by-id").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let by_slug = app.request("GET", &format!("/api/v1/public/by-id/slots?start={}&end={}&service_ids={}", monday, monday, service_id), None, None).await;
    let by_id = app.request("GET", &format!("/api/v1/public/{}/slots?start={}&end={}&service_ids={}", auth.admin_id, monday, monday, service_id), None, None).await;

    assert_eq!(by_id.status(), 200);
    assert_eq!(slot_strings(&parse_body(by_slug).await), slot_strings(&parse_body(by_id).await));

    let res = app.request("GET", &format!("/api/v1/public/ghost/slots?start={}&end={}", monday, monday), None, None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_blackouts_and_bookings_remove_slots() {
    let app = TestApp::new().await;
    let auth = app.admin("slots-blocked").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.request("POST", "/api/v1/admin/availability/blackouts", Some(&auth), Some(json!({
        "start_time": at(monday, "12:00"), "end_time": at(monday, "13:00")
    }))).await;
    assert_eq!(res.status(), 201);

    let uri = format!("/api/v1/public/slots-blocked/slots?start={}&end={}&service_ids={}", monday, monday, service_id);
    let slots = slot_strings(&parse_body(app.request("GET", &uri, None, None).await).await);
    assert_eq!(slots.len(), 12);
    assert!(!slots.contains(&at(monday, "11:30")), "11:30 would run into the blackout");
    assert!(!slots.contains(&at(monday, "12:00")));
    assert!(slots.contains(&at(monday, "13:00")));

    let res = app.public_booking("slots-blocked", &service_id, &at(monday, "09:00")).await;
    assert_eq!(res.status(), 201);

    let slots = slot_strings(&parse_body(app.request("GET", &uri, None, None).await).await);
    assert_eq!(slots.len(), 10);
    assert!(!slots.contains(&at(monday, "09:00")));
    assert!(!slots.contains(&at(monday, "09:30")));
    assert!(slots.contains(&at(monday, "10:00")));
}

#[tokio::test]
async fn test_default_buffer_extends_occupancy() {
    let app = TestApp::new().await;
    let auth = app.admin("buffered").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({
        "default_buffer_min": 30, "slot_step_min": 60
    }))).await;

    let uri = format!("/api/v1/public/buffered/slots?start={}&end={}&service_ids={}", monday, monday, service_id);
    let slots = slot_strings(&parse_body(app.request("GET", &uri, None, None).await).await);
    // 90 minutes of occupancy on an hourly grid: 09:00 .. 15:00.
    assert_eq!(slots.len(), 7);
    assert_eq!(slots.last().unwrap(), &at(monday, "15:00"));
}

#[tokio::test]
async fn test_booking_window_limits() {
    let app = TestApp::new().await;
    let auth = app.admin("window").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();
    let uri = format!("/api/v1/public/window/slots?start={}&end={}&service_ids={}", monday, monday, service_id);

    app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({ "max_advance_days": 0 }))).await;
    let slots = slot_strings(&parse_body(app.request("GET", &uri, None, None).await).await);
    assert!(slots.is_empty(), "Nothing is bookable beyond the advance window");

    app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({ "lead_time_min": 60 * 24 * 10 }))).await;
    let slots = slot_strings(&parse_body(app.request("GET", &uri, None, None).await).await);
    assert!(slots.is_empty(), "Lead time pushes every slot past this Monday");
}

#[tokio::test]
async fn test_oversized_settings_are_clamped_and_still_serve_slots() {
    let app = TestApp::new().await;
    let auth = app.admin("far-future").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({ "max_advance_days": 2_000_000_000 }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(parse_body(res).await["max_advance_days"], 3650);

    let uri = format!("/api/v1/public/far-future/dates?start={}&end=9999-12-31&service_ids={}", monday, service_id);
    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), 200);
    let dates = parse_body(res).await["dates"].as_array().unwrap().clone();
    assert_eq!(dates.first().unwrap(), &json!(monday.to_string()));

    let res = app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({
        "lead_time_min": 2_000_000_000, "max_advance_days": 2_000_000_000
    }))).await;
    assert_eq!(parse_body(res).await["lead_time_min"], 525_600);

    let uri = format!("/api/v1/public/far-future/slots?start={}&end={}&service_ids={}", monday, monday, service_id);
    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), 200);
    assert!(slot_strings(&parse_body(res).await).is_empty());
}

#[tokio::test]
async fn test_dates_lists_only_days_with_slots() {
    let app = TestApp::new().await;
    let auth = app.admin("dates").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();
    let sunday = monday + Duration::days(6);

    let uri = format!("/api/v1/public/dates/dates?start={}&end={}&service_ids={}", monday, sunday, service_id);
    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), 200);
    let body = parse_body(res).await;
    assert_eq!(body["dates"], json!([monday.to_string()]));

    app.request("POST", "/api/v1/admin/availability/blackouts", Some(&auth), Some(json!({
        "start_time": at(monday, "00:00"), "end_time": at(monday + Duration::days(1), "00:00")
    }))).await;

    let body = parse_body(app.request("GET", &uri, None, None).await).await;
    assert!(body["dates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rule_in_another_zone() {
    let app = TestApp::new().await;
    let auth = app.admin("berlin").await;
    let service_id = app.service(&auth, 60, 0).await;
    let monday = next_monday();

    app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({ "time_zone": "Europe/Berlin" }))).await;
    let res = app.request("POST", "/api/v1/admin/availability/rules", Some(&auth), Some(json!({
        "day_of_week": 1, "start_minutes": 540, "end_minutes": 600
    }))).await;
    assert_eq!(parse_body(res).await["time_zone"], "Europe/Berlin");

    let uri = format!("/api/v1/public/berlin/slots?start={}&end={}&service_ids={}", monday, monday, service_id);
    let body = parse_body(app.request("GET", &uri, None, None).await).await;
    assert_eq!(body["time_zone"], "Europe/Berlin");

    let slots = slot_strings(&body);
    assert_eq!(slots.len(), 1);
    // 09:00 in Berlin is 07:00 or 08:00 UTC depending on DST.
    assert!(slots[0] == at(monday, "07:00") || slots[0] == at(monday, "08:00"), "got {}", slots[0]);
}

#[tokio::test]
async fn test_unknown_service_is_rejected() {
    let app = TestApp::new().await;
    let auth = app.admin("svc-check").await;
    app.standard_setup(&auth).await;
    let monday = next_monday();

    let uri = format!("/api/v1/public/svc-check/slots?start={}&end={}&service_ids=nope", monday, monday);
    let res = app.request("GET", &uri, None, None).await;
    assert_eq!(res.status(), 400);
}
