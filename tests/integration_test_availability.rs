mod common;

use common::{parse_body, TestApp};
use axum::{body::Body, http::{header, Request}};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_rule_crud_lifecycle() {
    let app = TestApp::new().await;
    let auth = app.admin("rules-crud").await;

    let res = app.request("POST", "/api/v1/admin/availability/rules", Some(&auth), Some(json!({
        "day_of_week": 1, "start_minutes": 540, "end_minutes": 1020
    }))).await;
    assert_eq!(res.status(), 201);
    let rule = parse_body(res).await;
    let rule_id = rule["id"].as_str().unwrap().to_string();
    assert_eq!(rule["time_zone"], "UTC", "Rule should inherit the booking timezone");
    assert_eq!(rule["active"], true);

    let res = app.request("PATCH", &format!("/api/v1/admin/availability/rules/{}", rule_id), Some(&auth), Some(json!({
        "end_minutes": 720
    }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(parse_body(res).await["end_minutes"], 720);

    let res = app.request("GET", "/api/v1/admin/availability/rules", Some(&auth), None).await;
    let rules = parse_body(res).await;
    assert_eq!(rules.as_array().unwrap().len(), 1);

    let res = app.request("DELETE", &format!("/api/v1/admin/availability/rules/{}", rule_id), Some(&auth), None).await;
    assert_eq!(res.status(), 204);

    let res = app.request("DELETE", &format!("/api/v1/admin/availability/rules/{}", rule_id), Some(&auth), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_invalid_rules_are_rejected() {
    let app = TestApp::new().await;
    let auth = app.admin("rules-invalid").await;

    let cases = vec![
        json!({ "day_of_week": 7, "start_minutes": 540, "end_minutes": 1020 }),
        json!({ "day_of_week": 1, "start_minutes": 600, "end_minutes": 540 }),
        json!({ "day_of_week": 1, "start_minutes": 540, "end_minutes": 1500 }),
        json!({ "day_of_week": 1, "start_minutes": 540, "end_minutes": 1020, "time_zone": "Mars/Olympus" }),
    ];

    for payload in cases {
        let res = app.request("POST", "/api/v1/admin/availability/rules", Some(&auth), Some(payload.clone())).await;
        assert_eq!(res.status(), 400, "payload {} should be rejected", payload);
        assert_eq!(parse_body(res).await["code"], "VALIDATION_ERROR");
    }

    let res = app.request("GET", "/api/v1/admin/availability/rules", Some(&auth), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blackout_crud_and_validation() {
    let app = TestApp::new().await;
    let auth = app.admin("blackouts").await;

    let res = app.request("POST", "/api/v1/admin/availability/blackouts", Some(&auth), Some(json!({
        "start_time": "2030-01-02T10:00:00Z", "end_time": "2030-01-02T09:00:00Z"
    }))).await;
    assert_eq!(res.status(), 400);

    let res = app.request("POST", "/api/v1/admin/availability/blackouts", Some(&auth), Some(json!({
        "start_time": "2030-01-02T09:00:00Z", "end_time": "2030-01-02T12:00:00Z", "reason": "Dentist"
    }))).await;
    assert_eq!(res.status(), 201);
    let blackout_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.request("PATCH", &format!("/api/v1/admin/availability/blackouts/{}", blackout_id), Some(&auth), Some(json!({
        "end_time": "2030-01-02T08:00:00Z"
    }))).await;
    assert_eq!(res.status(), 400, "Update must not invert the interval");

    let res = app.request("PATCH", &format!("/api/v1/admin/availability/blackouts/{}", blackout_id), Some(&auth), Some(json!({
        "end_time": "2030-01-02T14:00:00Z"
    }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(parse_body(res).await["reason"], "Dentist");

    let res = app.request("DELETE", &format!("/api/v1/admin/availability/blackouts/{}", blackout_id), Some(&auth), None).await;
    assert_eq!(res.status(), 204);

    let res = app.request("GET", "/api/v1/admin/availability/blackouts", Some(&auth), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_settings_defaults_and_coercion() {
    let app = TestApp::new().await;
    let auth = app.admin("settings").await;

    let res = app.request("GET", "/api/v1/admin/booking-settings", Some(&auth), None).await;
    assert_eq!(res.status(), 200);
    let defaults = parse_body(res).await;
    assert_eq!(defaults["time_zone"], "UTC");
    assert_eq!(defaults["slot_step_min"], 30);
    assert_eq!(defaults["max_advance_days"], 60);
    assert_eq!(defaults["lead_time_min"], 0);

    let res = app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({
        "time_zone": "Europe/Berlin",
        "lead_time_min": -30,
        "max_advance_days": "not a number",
        "default_buffer_min": 15,
        "slot_step_min": 0
    }))).await;
    assert_eq!(res.status(), 200);
    let saved = parse_body(res).await;
    assert_eq!(saved["time_zone"], "Europe/Berlin");
    assert_eq!(saved["lead_time_min"], 0);
    assert_eq!(saved["max_advance_days"], 60);
    assert_eq!(saved["default_buffer_min"], 15);
    assert_eq!(saved["slot_step_min"], 30);

    let res = app.request("PUT", "/api/v1/admin/booking-settings", Some(&auth), Some(json!({
        "time_zone": "Not/AZone"
    }))).await;
    assert_eq!(res.status(), 400);

    // A rejected write leaves the stored settings untouched.
    let res = app.request("GET", "/api/v1/admin/booking-settings", Some(&auth), None).await;
    let current = parse_body(res).await;
    assert_eq!(current["time_zone"], "Europe/Berlin");
    assert_eq!(current["default_buffer_min"], 15);
}

#[tokio::test]
async fn test_admin_routes_require_session_and_csrf() {
    let app = TestApp::new().await;
    let auth = app.admin("guarded").await;

    let res = app.request("GET", "/api/v1/admin/availability/rules", None, None).await;
    assert_eq!(res.status(), 401);

    let res = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/admin/availability/rules")
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "day_of_week": 1, "start_minutes": 540, "end_minutes": 1020 }).to_string()))
            .unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), 403, "Mutations without a CSRF header must be refused");

    let res = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/admin/availability/rules")
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header("X-CSRF-Token", "wrong")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "day_of_week": 1, "start_minutes": 540, "end_minutes": 1020 }).to_string()))
            .unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), 403);

    let res = app.router.clone().oneshot(
        Request::builder()
            .method("GET")
            .uri("/api/v1/admin/availability/rules")
            .header(header::COOKIE, "access_token=garbage")
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn test_admins_are_isolated_from_each_other() {
    let app = TestApp::new().await;
    let alice = app.admin("alice").await;
    let bob = app.admin("bob").await;

    let res = app.request("POST", "/api/v1/admin/availability/rules", Some(&alice), Some(json!({
        "day_of_week": 2, "start_minutes": 600, "end_minutes": 660
    }))).await;
    let rule_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app.request("PATCH", &format!("/api/v1/admin/availability/rules/{}", rule_id), Some(&bob), Some(json!({
        "active": false
    }))).await;
    assert_eq!(res.status(), 404);

    let res = app.request("DELETE", &format!("/api/v1/admin/availability/rules/{}", rule_id), Some(&bob), None).await;
    assert_eq!(res.status(), 404);

    let res = app.request("GET", "/api/v1/admin/availability/rules", Some(&bob), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());

    let res = app.request("GET", "/api/v1/admin/availability/rules", Some(&alice), None).await;
    let rules = parse_body(res).await;
    assert_eq!(rules[0]["active"], true);
}

#[tokio::test]
async fn test_registration_and_login() {
    let app = TestApp::new().await;

    let res = app.request("POST", "/api/v1/admins", None, Some(json!({
        "slug": "Bad Slug!", "name": "X", "email": "x@example.com"
    }))).await;
    assert_eq!(res.status(), 400);

    let res = app.request("POST", "/api/v1/admins", None, Some(json!({
        "slug": "jane", "name": "Jane", "email": "jane@example.com"
    }))).await;
    assert_eq!(res.status(), 201);
    let secret = parse_body(res).await["admin_secret"].as_str().unwrap().to_string();

    let res = app.request("POST", "/api/v1/admins", None, Some(json!({
        "slug": "jane", "name": "Jane Again", "email": "jane2@example.com"
    }))).await;
    assert_eq!(res.status(), 409, "Slugs are unique");

    let res = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "slug": "jane", "password": "wrong-secret"
    }))).await;
    assert_eq!(res.status(), 401);

    let auth = app.login("jane", &secret).await;
    assert!(!auth.csrf_token.is_empty());

    let res = app.request("GET", "/api/v1/admin/booking-settings", Some(&auth), None).await;
    assert_eq!(res.status(), 200);
}
