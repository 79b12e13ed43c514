use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::api::extractors::auth::decode_principal;
use crate::domain::models::auth::Principal;
use std::convert::Infallible;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::debug;

/// The caller if a valid session cookie is present, otherwise an anonymous
/// principal. Public routes never reject on auth.
pub struct MaybePrincipal(pub Principal);

impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(access_token) = parts.extensions.get::<Cookies>()
            .and_then(|cookies| cookies.get("access_token"))
            .map(|cookie| cookie.value().to_string())
        else {
            return Ok(MaybePrincipal(Principal::anonymous()));
        };

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        match decode_principal(&app_state.config.jwt_public_key, &access_token) {
            Ok((principal, _)) => Ok(MaybePrincipal(principal)),
            Err(e) => {
                debug!("Ignoring invalid session on public route: {}", e);
                Ok(MaybePrincipal(Principal::anonymous()))
            }
        }
    }
}
