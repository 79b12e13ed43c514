use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use crate::domain::models::admin::Admin;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// The admin named by the `{admin}` path segment, looked up by slug first
/// and then by id.
pub struct AdminRef(pub Admin);

impl FromRequestParts<Arc<AppState>> for AdminRef {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid path".into()))?;

        let key = params.get("admin")
            .ok_or_else(|| AppError::Validation("Missing admin".into()))?;

        if let Some(admin) = state.repos.admins.find_by_slug(key).await? {
            return Ok(AdminRef(admin));
        }
        state.repos.admins.find_by_id(key).await?
            .map(AdminRef)
            .ok_or_else(|| AppError::NotFound("Admin not found".into()))
    }
}
