pub mod admin_ref;
pub mod auth;
pub mod maybe_auth;
