mod common;

use booking_engine::error::AppError;
use chrono::Utc;
use common::{at, next_monday, parse_body, TestApp};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

async fn wait_for_emails(app: &TestApp, expected: usize) -> usize {
    for _ in 0..40 {
        let count = app.email.sent.lock().unwrap().len();
        if count >= expected {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    app.email.sent.lock().unwrap().len()
}

#[tokio::test]
async fn test_public_booking_is_pending_and_notifies_customer() {
    let app = TestApp::new().await;
    let auth = app.admin("pub-book").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("pub-book", &service_id, &at(monday, "10:00")).await;
    assert_eq!(res.status(), 201);
    let booking = parse_body(res).await;
    assert_eq!(booking["status"], "PENDING");
    assert_eq!(booking["start_time"], at(monday, "10:00"));
    assert_eq!(booking["end_time"], at(monday, "11:00"));
    assert_eq!(booking["service_ids"], json!([service_id]));
    assert!(booking["external_event_id"].is_null());

    assert_eq!(wait_for_emails(&app, 1).await, 1);
    let sent = app.email.sent.lock().unwrap();
    assert_eq!(sent[0].0, "alice@example.com");
    assert_eq!(sent[0].2.as_deref(), Some("appointment.ics"));
}

#[tokio::test]
async fn test_admin_bookings_are_confirmed() {
    let app = TestApp::new().await;
    let auth = app.admin("confirmer").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.request("POST", "/api/v1/admin/bookings", Some(&auth), Some(json!({
        "start": at(monday, "09:00"),
        "service_ids": [service_id],
        "customer_name": "Walk-in",
        "customer_email": "walkin@example.com"
    }))).await;
    assert_eq!(res.status(), 201);
    assert_eq!(parse_body(res).await["status"], "CONFIRMED");

    // Logged in on their own public page.
    let res = app.request("POST", "/api/v1/public/confirmer/bookings", Some(&auth), Some(json!({
        "start": at(monday, "11:00"),
        "service_ids": [service_id],
        "customer_name": "Phone call",
        "customer_email": "phone@example.com"
    }))).await;
    assert_eq!(res.status(), 201);
    assert_eq!(parse_body(res).await["status"], "CONFIRMED");

    // Another admin's session counts as a regular customer.
    let other = app.admin("someone-else").await;
    let res = app.request("POST", "/api/v1/public/confirmer/bookings", Some(&other), Some(json!({
        "start": at(monday, "13:00"),
        "service_ids": [service_id],
        "customer_name": "Colleague",
        "customer_email": "colleague@example.com"
    }))).await;
    assert_eq!(res.status(), 201);
    assert_eq!(parse_body(res).await["status"], "PENDING");
}

#[tokio::test]
async fn test_unavailable_starts_are_rejected() {
    let app = TestApp::new().await;
    let auth = app.admin("conflicts").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("conflicts", &service_id, &at(monday, "10:00")).await;
    assert_eq!(res.status(), 201);

    for start in ["10:00", "10:30", "09:30", "09:10", "16:30", "20:00"] {
        let res = app.public_booking("conflicts", &service_id, &at(monday, start)).await;
        assert_eq!(res.status(), 409, "start {} should not be bookable", start);
        assert_eq!(parse_body(res).await["code"], "SLOT_UNAVAILABLE");
    }

    let res = app.public_booking("conflicts", &service_id, &at(monday, "11:00")).await;
    assert_eq!(res.status(), 201, "Back-to-back bookings are fine");
}

#[tokio::test]
async fn test_booking_input_validation() {
    let app = TestApp::new().await;
    let auth = app.admin("validator").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let cases = vec![
        json!({ "start": at(monday, "09:00"), "service_ids": [], "customer_name": "A", "customer_email": "a@example.com" }),
        json!({ "start": at(monday, "09:00"), "service_ids": [service_id], "customer_name": " ", "customer_email": "a@example.com" }),
        json!({ "start": at(monday, "09:00"), "service_ids": [service_id], "customer_name": "A", "customer_email": "not-an-email" }),
        json!({ "start": at(monday, "09:00"), "service_ids": ["unknown"], "customer_name": "A", "customer_email": "a@example.com" }),
    ];

    for payload in cases {
        let res = app.request("POST", "/api/v1/public/validator/bookings", None, Some(payload.clone())).await;
        assert_eq!(res.status(), 400, "payload {} should fail validation", payload);
    }

    let res = app.request("GET", "/api/v1/admin/bookings", Some(&auth), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_transitions() {
    let app = TestApp::new().await;
    let auth = app.admin("lifecycle").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("lifecycle", &service_id, &at(monday, "09:00")).await;
    let booking_id = parse_body(res).await["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/v1/admin/bookings/{}/status", booking_id);

    let res = app.request("POST", &status_uri, Some(&auth), Some(json!({ "status": "COMPLETED" }))).await;
    assert_eq!(res.status(), 409);
    assert_eq!(parse_body(res).await["code"], "INVALID_TRANSITION");

    let res = app.request("POST", &status_uri, Some(&auth), Some(json!({ "status": "bogus" }))).await;
    assert_eq!(res.status(), 400);

    let res = app.request("POST", &status_uri, Some(&auth), Some(json!({ "status": "CONFIRMED" }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(parse_body(res).await["status"], "CONFIRMED");

    let res = app.request("POST", &status_uri, Some(&auth), Some(json!({ "status": "PENDING" }))).await;
    assert_eq!(res.status(), 409);

    let res = app.request("POST", &status_uri, Some(&auth), Some(json!({ "status": "COMPLETED" }))).await;
    assert_eq!(res.status(), 200);

    let res = app.request("POST", &format!("/api/v1/admin/bookings/{}/cancel", booking_id), Some(&auth), None).await;
    assert_eq!(res.status(), 409, "Completed bookings stay completed");

    let res = app.request("PATCH", &format!("/api/v1/admin/bookings/{}", booking_id), Some(&auth), Some(json!({
        "start": at(monday, "14:00")
    }))).await;
    assert_eq!(res.status(), 409);
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_frees_the_slot() {
    let app = TestApp::new().await;
    let auth = app.admin("canceller").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("canceller", &service_id, &at(monday, "09:00")).await;
    let booking_id = parse_body(res).await["id"].as_str().unwrap().to_string();
    let cancel_uri = format!("/api/v1/admin/bookings/{}/cancel", booking_id);

    let first = parse_body(app.request("POST", &cancel_uri, Some(&auth), None).await).await;
    assert_eq!(first["status"], "CANCELLED");

    let res = app.request("POST", &cancel_uri, Some(&auth), None).await;
    assert_eq!(res.status(), 200);
    let second = parse_body(res).await;
    assert_eq!(second["status"], "CANCELLED");
    assert_eq!(second["updated_at"], first["updated_at"]);

    let res = app.public_booking("canceller", &service_id, &at(monday, "09:00")).await;
    assert_eq!(res.status(), 201, "Cancelled bookings release their time");
}

#[tokio::test]
async fn test_stale_writes_cannot_revive_a_cancelled_booking() {
    let app = TestApp::new().await;
    let auth = app.admin("stale").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("stale", &service_id, &at(monday, "09:00")).await;
    let booking_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    // Read before the cancel lands, the way a slow concurrent request would.
    let repo = app.state.repos.bookings.clone();
    let stale = repo.find_by_id(&auth.admin_id, &booking_id).await.unwrap().unwrap();

    let res = app.request("POST", &format!("/api/v1/admin/bookings/{}/cancel", booking_id), Some(&auth), None).await;
    assert_eq!(parse_body(res).await["status"], "CANCELLED");

    let mut edited = stale.clone();
    edited.notes = Some("Late edit".into());
    edited.updated_at = Utc::now();
    let saved = repo.update_contact(&edited).await.unwrap();
    assert_eq!(saved.status, "CANCELLED");
    assert_eq!(saved.notes.as_deref(), Some("Late edit"));

    let mut confirmed = stale.clone();
    confirmed.status = "CONFIRMED".into();
    assert!(repo.transition(&stale, &confirmed).await.unwrap().is_none());

    let mut moved = stale.clone();
    moved.start_time = stale.start_time + chrono::Duration::hours(4);
    moved.end_time = stale.end_time + chrono::Duration::hours(4);
    let res = repo.reschedule_if_available(&moved).await;
    assert!(matches!(res, Err(AppError::InvalidTransition(_))));

    let linked = repo.set_external_event(&auth.admin_id, &booking_id, Some("evt-late"), Utc::now()).await.unwrap();
    assert_eq!(linked.status, "CANCELLED");

    let res = app.public_booking("stale", &service_id, &at(monday, "09:00")).await;
    assert_eq!(res.status(), 201, "The cancelled slot stays free");

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE status != 'CANCELLED'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn test_reschedule_and_contact_update() {
    let app = TestApp::new().await;
    let auth = app.admin("mover").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("mover", &service_id, &at(monday, "09:00")).await;
    let booking_id = parse_body(res).await["id"].as_str().unwrap().to_string();
    app.public_booking("mover", &service_id, &at(monday, "13:00")).await;
    let booking_uri = format!("/api/v1/admin/bookings/{}", booking_id);

    let res = app.request("PATCH", &booking_uri, Some(&auth), Some(json!({ "start": at(monday, "12:30") }))).await;
    assert_eq!(res.status(), 409, "12:30 overlaps the 13:00 booking");

    let res = app.request("PATCH", &booking_uri, Some(&auth), Some(json!({ "start": at(monday, "09:30") }))).await;
    assert_eq!(res.status(), 200, "Moving within its own slot is allowed");

    let res = app.request("PATCH", &booking_uri, Some(&auth), Some(json!({
        "start": at(monday, "15:00"),
        "notes": "Gate code 1234"
    }))).await;
    assert_eq!(res.status(), 200);
    let moved = parse_body(res).await;
    assert_eq!(moved["start_time"], at(monday, "15:00"));
    assert_eq!(moved["end_time"], at(monday, "16:00"));
    assert_eq!(moved["notes"], "Gate code 1234");
    assert_eq!(moved["customer_name"], "Alice");

    let res = app.public_booking("mover", &service_id, &at(monday, "09:00")).await;
    assert_eq!(res.status(), 201, "The old slot is free again");

    let res = app.request("PATCH", &booking_uri, Some(&auth), Some(json!({ "customer_email": "broken" }))).await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_list_filters_and_tenant_isolation() {
    let app = TestApp::new().await;
    let auth = app.admin("lister").await;
    let service_id = app.standard_setup(&auth).await;
    let monday = next_monday();

    let res = app.public_booking("lister", &service_id, &at(monday, "09:00")).await;
    let first_id = parse_body(res).await["id"].as_str().unwrap().to_string();
    app.public_booking("lister", &service_id, &at(monday, "14:00")).await;
    app.request("POST", &format!("/api/v1/admin/bookings/{}/cancel", first_id), Some(&auth), None).await;

    let all: Value = parse_body(app.request("GET", "/api/v1/admin/bookings", Some(&auth), None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["id"], first_id.as_str(), "Ordered by start time");

    let pending = parse_body(app.request("GET", "/api/v1/admin/bookings?status=pending", Some(&auth), None).await).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["start_time"], at(monday, "14:00"));

    let uri = format!("/api/v1/admin/bookings?from={}&to={}", at(monday, "13:00"), at(monday, "17:00"));
    let ranged = parse_body(app.request("GET", &uri, Some(&auth), None).await).await;
    assert_eq!(ranged.as_array().unwrap().len(), 1);

    let res = app.request("GET", "/api/v1/admin/bookings?status=LOST", Some(&auth), None).await;
    assert_eq!(res.status(), 400);

    let intruder = app.admin("intruder").await;
    let res = app.request("GET", &format!("/api/v1/admin/bookings/{}", first_id), Some(&intruder), None).await;
    assert_eq!(res.status(), 404);
    let res = app.request("POST", &format!("/api/v1/admin/bookings/{}/status", first_id), Some(&intruder), Some(json!({ "status": "CONFIRMED" }))).await;
    assert_eq!(res.status(), 404);
    let listed = parse_body(app.request("GET", "/api/v1/admin/bookings", Some(&intruder), None).await).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_for_one_slot() {
    let app = Arc::new(TestApp::new().await);
    let auth = app.admin("rush").await;
    let service_id = app.standard_setup(&auth).await;
    let start = at(next_monday(), "10:00");

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let app = app.clone();
        let service_id = service_id.clone();
        let start = start.clone();
        set.spawn(async move {
            app.public_booking("rush", &service_id, &start).await.status().as_u16()
        });
    }

    let mut created = 0;
    let mut rejected = 0;
    while let Some(result) = set.join_next().await {
        match result.unwrap() {
            201 => created += 1,
            409 => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1, "Exactly one request may win the slot");
    assert_eq!(rejected, 7);

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE status != 'CANCELLED'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}
