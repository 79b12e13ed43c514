use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::dtos::requests::LoginRequest;
use crate::error::AppError;
use crate::domain::models::{admin::Admin, auth::{AdminProfile, AuthResponse}};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use argon2::{PasswordHash, Argon2, PasswordVerifier};
use tracing::info;

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state.repos.admins.find_by_slug(&payload.slug.trim().to_lowercase()).await?
        .ok_or(AppError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&admin.password_hash)
        .map_err(|_| AppError::Internal)?;

    Argon2::default().verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized)?;

    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&admin).await?;
    set_cookies(&cookies, &access_jwt, &refresh_token);

    info!("Admin logged in: {}", admin.id);

    Ok(Json(auth_response(csrf_token, admin)))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let refresh_cookie = cookies.get("refresh_token").ok_or(AppError::Unauthorized)?;
    let raw_token = refresh_cookie.value();

    let token_hash = state.auth_service.hash_token(raw_token);
    let record = state.repos.auth.find_refresh_token(&token_hash).await?
        .ok_or(AppError::Unauthorized)?;

    let admin = state.repos.admins.find_by_id(&record.admin_id).await?
        .ok_or(AppError::Unauthorized)?;

    let (new_access, new_refresh, new_csrf) = state.auth_service.refresh(raw_token, &admin).await?;
    set_cookies(&cookies, &new_access, &new_refresh);

    info!("Token refreshed for admin: {}", admin.id);

    Ok(Json(auth_response(new_csrf, admin)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get("refresh_token") {
        state.auth_service.logout(cookie.value()).await?;
    }

    cookies.remove(Cookie::build(("access_token", "")).path("/").into());
    cookies.remove(Cookie::build(("refresh_token", "")).path("/").into());

    Ok(StatusCode::NO_CONTENT)
}

fn auth_response(csrf_token: String, admin: Admin) -> AuthResponse {
    AuthResponse {
        csrf_token,
        admin: AdminProfile {
            id: admin.id,
            slug: admin.slug,
            name: admin.name,
            role: admin.role,
        },
    }
}

fn session_cookie(name: &'static str, value: &str, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value.to_string());
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    cookie
}

fn set_cookies(cookies: &Cookies, access: &str, refresh: &str) {
    cookies.add(session_cookie("access_token", access, Duration::minutes(15)));
    cookies.add(session_cookie("refresh_token", refresh, Duration::days(7)));
}
