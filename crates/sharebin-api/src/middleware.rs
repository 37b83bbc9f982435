use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use sharebin_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer JWT, then expose the caller's current
/// claims to handlers as `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;
    let claims = current_claims(&state, bearer.token()).await?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Decodes the token, then replaces its username and role with what the
/// store holds now. A token for a deleted user is rejected.
pub async fn current_claims(state: &AppState, token: &str) -> Result<Claims, ApiError> {
    let claims = decode_claims(&state.jwt_secret, token)?;
    let user_id = claims.sub.clone();
    let user = state
        .run_blocking(move |state| Ok(state.db.get_user_by_id(&user_id)?))
        .await?
        .ok_or_else(|| {
            debug!("Token for unknown user {}", claims.sub);
            ApiError::Unauthorized
        })?;

    Ok(Claims {
        role: user.role(),
        username: user.username,
        sub: user.id,
        exp: claims.exp,
    })
}

pub fn decode_claims(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    Ok(token_data.claims)
}

/// Only admins get past this.
pub fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin role required"))
    }
}
