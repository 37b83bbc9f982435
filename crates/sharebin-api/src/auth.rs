use std::sync::Arc;

use axum::{Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use sharebin_db::Database;
use sharebin_db::models::UserRow;
use sharebin_types::api::{Claims, LoginRequest, LoginResponse};

use crate::credentials::{Argon2Credentials, CredentialVerifier};
use crate::error::ApiError;

/// How long a login token stays valid.
const TOKEN_TTL_DAYS: i64 = 30;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub credentials: Box<dyn CredentialVerifier>,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String) -> Self {
        Self::with_credentials(db, jwt_secret, Box::new(Argon2Credentials::default()))
    }

    pub fn with_credentials(
        db: Database,
        jwt_secret: String,
        credentials: Box<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            db,
            jwt_secret,
            credentials,
        }
    }

    /// Run store and hashing work off the async runtime.
    pub async fn run_blocking<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal
            })?
    }
}

/// POST /api/login — `username` and `email` are both tried against both
/// columns; the password is checked against the stored hash.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.username.is_empty() && req.email.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    let user = state
        .run_blocking(move |state| {
            let user = state
                .db
                .find_user_for_login(&req.username, &req.email)?
                .ok_or(ApiError::InvalidCredentials)?;

            if !state.credentials.verify(&req.password, &user.password) {
                return Err(ApiError::InvalidCredentials);
            }
            Ok(user)
        })
        .await?;

    let token = create_token(&state.jwt_secret, &user).map_err(|e| {
        error!("Failed to sign token for {}: {}", user.id, e);
        ApiError::Internal
    })?;

    info!("{} logged in as {}", user.username, user.role);
    Ok(Json(LoginResponse {
        user: user.into(),
        token,
    }))
}

pub fn create_token(secret: &str, user: &UserRow) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        role: user.role(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
