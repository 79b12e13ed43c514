use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord}, admin::Admin},
    ports::AuthRepository
};
use crate::error::AppError;
use crate::config::Config;
use jsonwebtoken::{encode, EncodingKey, Header, Algorithm};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Sha256, Digest};

pub const AUDIENCE: &str = "booking-engine-frontend";

/// (access jwt, raw refresh token, csrf token)
pub type TokenPair = (String, String, String);

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    config: Config,
    encoding_key: EncodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, config: Config) -> Self {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .expect("Invalid JWT Private Key PEM");

        Self { repo, config, encoding_key }
    }

    pub async fn login(&self, admin: &Admin) -> Result<TokenPair, AppError> {
        self.issue_token_pair(admin, Uuid::new_v4(), 1).await
    }

    /// Rotates a refresh token. Presenting an expired token kills its whole family.
    pub async fn refresh(&self, raw_refresh_token: &str, admin: &Admin) -> Result<TokenPair, AppError> {
        let token_hash = self.hash_token(raw_refresh_token);

        let record = self.repo.find_refresh_token(&token_hash).await?
            .ok_or(AppError::Unauthorized)?;

        if record.expires_at < Utc::now() {
            self.repo.delete_refresh_family(record.family_id).await?;
            return Err(AppError::Unauthorized);
        }

        self.repo.delete_refresh_token(&token_hash).await?;
        self.issue_token_pair(admin, record.family_id, record.generation_id + 1).await
    }

    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        match self.repo.find_refresh_token(&token_hash).await? {
            Some(record) => self.repo.delete_refresh_family(record.family_id).await,
            None => Ok(()),
        }
    }

    async fn issue_token_pair(&self, admin: &Admin, family_id: Uuid, generation_id: i32) -> Result<TokenPair, AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();
        let exp = (now + Duration::minutes(15)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: admin.id.clone(),
            aud: AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            role: admin.role.clone(),
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();

        let refresh_record = RefreshTokenRecord {
            token_hash: self.hash_token(&refresh_token),
            admin_id: admin.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(7),
            created_at: now,
        };

        self.repo.create_refresh_token(&refresh_record).await?;
        Ok((access_token, refresh_token, csrf_token))
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
