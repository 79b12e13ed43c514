use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub frontend_url: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_calendar_api_url: String,
    pub google_token_url: String,
    pub google_revoke_url: String,
    pub calendar_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.booking-engine.local".to_string()),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_calendar_api_url: env::var("GOOGLE_CALENDAR_API_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
            google_revoke_url: env::var("GOOGLE_REVOKE_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/revoke".to_string()),
            calendar_timeout_secs: env::var("CALENDAR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}
