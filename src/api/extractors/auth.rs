use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::domain::models::auth::{Claims, Principal, Role};
use crate::domain::services::auth_service::AUDIENCE;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::Span;

/// Verifies the `access_token` cookie and returns the caller.
pub fn decode_principal(config_public_key: &str, access_token: &str) -> Result<(Principal, String), AppError> {
    let decoding_key = DecodingKey::from_ed_pem(config_public_key.as_bytes())
        .map_err(|_| AppError::Internal)?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[AUDIENCE]);

    let token_data = decode::<Claims>(access_token, &decoding_key, &validation)
        .map_err(|_| AppError::Unauthorized)?;

    let claims = token_data.claims;
    Ok((Principal::new(claims.sub, Role::parse(&claims.role)), claims.csrf_token))
}

/// An authenticated admin. 401 without a valid session, 403 for other roles
/// or a missing/mismatching CSRF header on mutating requests.
pub struct AdminPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(AppError::Internal)?;

        let access_token = cookies.get("access_token")
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let (principal, csrf_token) = decode_principal(&app_state.config.jwt_public_key, &access_token)?;

        let method = &parts.method;
        if method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AppError::Forbidden("Missing CSRF token".into()))?;

            if csrf_header_val != csrf_token {
                return Err(AppError::Forbidden("Invalid CSRF token".into()));
            }
        }

        if !principal.is_admin() {
            return Err(AppError::Forbidden("Admin role required".into()));
        }

        Span::current().record("admin_id", principal.id.as_str());

        Ok(AdminPrincipal(principal))
    }
}
