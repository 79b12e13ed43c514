use booking_engine::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::calendar::{CalendarCredential, CalendarSummary, EventDraft, RemoteEvent},
    domain::ports::{CalendarProvider, EmailService},
    domain::services::notification::load_templates,
    error::{AppError, CalendarError},
    infra::calendar::google_calendar::{event_body, parse_remote_event},
    infra::factory::sqlite_repositories,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc, Weekday};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<(String, String, Option<String>)>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _html_body: &str,
        attachment_name: Option<&str>,
        _attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push((recipient.to_string(), subject.to_string(), attachment_name.map(String::from)));
        Ok(())
    }
}

/// In-memory calendar. Events are stored as Google-shaped JSON so the
/// production parser is exercised.
#[derive(Default)]
pub struct MockCalendarProvider {
    pub events: Mutex<HashMap<String, Value>>,
    pub failing: AtomicBool,
    pub slow: AtomicBool,
    pub created: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    pub revoked: AtomicUsize,
}

#[allow(dead_code)]
impl MockCalendarProvider {
    pub fn put_event(&self, id: &str, event: Value) {
        self.events.lock().unwrap().insert(id.to_string(), event);
    }

    async fn gate(&self) -> Result<(), CalendarError> {
        if self.slow.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CalendarError::Upstream("mock outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    async fn list_calendars(&self, _admin_id: &str) -> Result<Vec<CalendarSummary>, CalendarError> {
        self.gate().await?;
        Ok(vec![
            CalendarSummary { id: "primary".into(), display_name: "Me".into(), is_primary: true },
            CalendarSummary { id: "team@group.calendar".into(), display_name: "Team".into(), is_primary: false },
        ])
    }

    async fn get_event(&self, _admin_id: &str, _calendar_id: &str, event_id: &str) -> Result<RemoteEvent, CalendarError> {
        self.gate().await?;
        let raw = self.events.lock().unwrap().get(event_id).cloned().ok_or(CalendarError::NotFound)?;
        parse_remote_event(raw)
    }

    async fn create_event(&self, _admin_id: &str, _calendar_id: &str, draft: &EventDraft) -> Result<RemoteEvent, CalendarError> {
        self.gate().await?;
        let id = format!("evt-{}", self.created.fetch_add(1, Ordering::SeqCst) + 1);
        let mut body = event_body(draft);
        body["id"] = json!(id);
        body["status"] = json!("confirmed");
        self.put_event(&id, body.clone());
        parse_remote_event(body)
    }

    async fn update_event(&self, _admin_id: &str, _calendar_id: &str, event_id: &str, draft: &EventDraft) -> Result<RemoteEvent, CalendarError> {
        self.gate().await?;
        let mut body = event_body(draft);
        body["id"] = json!(event_id);
        body["status"] = json!("confirmed");
        self.put_event(event_id, body.clone());
        parse_remote_event(body)
    }

    async fn delete_event(&self, _admin_id: &str, _calendar_id: &str, event_id: &str) -> Result<(), CalendarError> {
        self.gate().await?;
        self.events.lock().unwrap().remove(event_id);
        self.deleted.lock().unwrap().push(event_id.to_string());
        Ok(())
    }

    async fn revoke(&self, _credential: &CalendarCredential) -> Result<(), CalendarError> {
        self.gate().await?;
        self.revoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct AuthHeaders {
    pub admin_id: String,
    pub slug: String,
    pub access_token: String,
    pub csrf_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
    pub calendar: Arc<MockCalendarProvider>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            frontend_url: "http://localhost".to_string(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            google_client_id: "client".to_string(),
            google_client_secret: "secret".to_string(),
            google_calendar_api_url: "http://localhost/calendar/v3".to_string(),
            google_token_url: "http://localhost/token".to_string(),
            google_revoke_url: "http://localhost/revoke".to_string(),
            calendar_timeout_secs: 1,
        };

        let email = Arc::new(MockEmailService::default());
        let calendar = Arc::new(MockCalendarProvider::default());

        let state = Arc::new(AppState::new(
            config,
            sqlite_repositories(pool.clone()),
            email.clone(),
            calendar.clone(),
            Arc::new(load_templates()),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            email,
            calendar,
        }
    }

    /// Registers an admin and logs in with the returned secret.
    pub async fn admin(&self, slug: &str) -> AuthHeaders {
        let res = self.request("POST", "/api/v1/admins", None, Some(json!({
            "slug": slug,
            "name": format!("Admin {}", slug),
            "email": format!("{}@example.com", slug),
        }))).await;
        assert_eq!(res.status(), 201, "admin registration failed");
        let body = parse_body(res).await;
        let secret = body["admin_secret"].as_str().unwrap().to_string();

        self.login(slug, &secret).await
    }

    pub async fn login(&self, slug: &str, password: &str) -> AuthHeaders {
        let payload = json!({ "slug": slug, "password": password });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let cookies: Vec<String> = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .collect();

        let access_token_cookie = cookies.iter()
            .find(|c| c.contains("access_token="))
            .expect("No access_token cookie returned");

        let start = access_token_cookie.find("access_token=").unwrap() + 13;
        let end = access_token_cookie[start..].find(';').unwrap_or(access_token_cookie.len() - start);
        let access_token = access_token_cookie[start..start+end].to_string();

        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();
        let admin_id = body_json["admin"]["id"].as_str().unwrap().to_string();

        AuthHeaders {
            admin_id,
            slug: slug.to_string(),
            access_token,
            csrf_token,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Monday 09:00-17:00 UTC plus one 60 minute service. Returns the service id.
    pub async fn standard_setup(&self, auth: &AuthHeaders) -> String {
        let res = self.request("POST", "/api/v1/admin/availability/rules", Some(auth), Some(json!({
            "day_of_week": 1, "start_minutes": 540, "end_minutes": 1020, "time_zone": "UTC"
        }))).await;
        assert_eq!(res.status(), 201);

        self.service(auth, 60, 0).await
    }

    pub async fn service(&self, auth: &AuthHeaders, duration_min: i32, price_cents: i64) -> String {
        let res = self.request("POST", "/api/v1/admin/categories", Some(auth), Some(json!({ "name": "Photography" }))).await;
        assert_eq!(res.status(), 201);
        let category_id = parse_body(res).await["id"].as_str().unwrap().to_string();

        let res = self.request("POST", "/api/v1/admin/services", Some(auth), Some(json!({
            "category_id": category_id,
            "name": format!("Shoot {}", duration_min),
            "duration_min": duration_min,
            "price_cents": price_cents,
        }))).await;
        assert_eq!(res.status(), 201);
        parse_body(res).await["id"].as_str().unwrap().to_string()
    }

    pub async fn public_booking(&self, slug: &str, service_id: &str, start: &str) -> Response {
        self.request("POST", &format!("/api/v1/public/{}/bookings", slug), None, Some(json!({
            "start": start,
            "service_ids": [service_id],
            "customer_name": "Alice",
            "customer_email": "alice@example.com",
            "property_address": "1 Main St",
        }))).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// A Monday at least a day away, so default lead times never interfere.
#[allow(dead_code)]
pub fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + ChronoDuration::days(1);
    while date.weekday() != Weekday::Mon {
        date += ChronoDuration::days(1);
    }
    date
}

#[allow(dead_code)]
pub fn at(date: NaiveDate, hh_mm: &str) -> String {
    format!("{}T{}:00Z", date.format("%Y-%m-%d"), hh_mm)
}
