use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{info, warn};
use uuid::Uuid;

use sharebin_db::models::{UserRow, now_timestamp};
use sharebin_types::api::{
    ChangePasswordRequest, Claims, RegisterRequest, SetRoleRequest, StatusMessage,
    UpdateProfileRequest,
};
use sharebin_types::{PublicUser, Role};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{current_claims, require_admin};

/// GET /api/users — admin only; password hashes are never included.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    require_admin(&claims)?;
    let rows = state.run_blocking(|state| Ok(state.db.list_users()?)).await?;
    Ok(Json(rows.into_iter().map(PublicUser::from).collect()))
}

/// POST /api/users — sign-up. The requested role is honoured only when the
/// caller presents an admin token; everyone else becomes a plain user.
pub async fn create_user(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password is required".into()));
    }

    let caller_is_admin = match bearer {
        Some(TypedHeader(Authorization(b))) => current_claims(&state, b.token())
            .await
            .is_ok_and(|claims| claims.is_admin()),
        None => false,
    };

    let role = match req.role {
        Some(role) if caller_is_admin => role,
        Some(Role::Admin) => {
            warn!("Sign-up for '{}' asked for admin without an admin token", req.username);
            Role::User
        }
        _ => Role::User,
    };

    let row = state
        .run_blocking(move |state| {
            if state.db.get_user_by_username(&req.username)?.is_some() {
                return Err(ApiError::Conflict(format!(
                    "Username \"{}\" already exists.",
                    req.username
                )));
            }

            let row = UserRow {
                id: Uuid::new_v4().to_string(),
                password: state.credentials.hash(&req.password)?,
                username: req.username,
                email: req.email,
                name: req.name,
                role: role.to_string(),
                created_at: now_timestamp(),
            };
            state.db.create_user(&row)?;
            Ok(row)
        })
        .await?;

    info!("User {} registered as {}", row.username, row.role);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT /api/users/{id} — self or admin. Absent fields keep their values.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if !claims.may_modify(&id) {
        return Err(ApiError::Forbidden("you may only edit your own profile"));
    }
    if req.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
        return Err(ApiError::BadRequest("username cannot be empty".into()));
    }

    let row = state
        .run_blocking(move |state| {
            if let Some(username) = req.username.as_deref() {
                if let Some(taken) = state.db.get_user_by_username(username)? {
                    if taken.id != id {
                        return Err(ApiError::Conflict(format!(
                            "Username \"{}\" already exists.",
                            username
                        )));
                    }
                }
            }
            state
                .db
                .update_user_profile(
                    &id,
                    req.name.as_deref(),
                    req.email.as_deref(),
                    req.username.as_deref(),
                )?
                .ok_or(ApiError::NotFound("user"))
        })
        .await?;

    Ok(Json(row.into()))
}

/// PUT /api/users/{id}/password — users change their own password by
/// presenting the current one; admins reset anyone else's without it.
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    if !claims.may_modify(&id) {
        return Err(ApiError::Forbidden("you may only change your own password"));
    }
    if req.new_password.is_empty() {
        return Err(ApiError::BadRequest("new password is required".into()));
    }

    let is_self = claims.sub == id;
    let target = id.clone();
    state
        .run_blocking(move |state| {
            let user = state.db.get_user_by_id(&target)?.ok_or(ApiError::NotFound("user"))?;

            if is_self {
                let current = req.current_password.as_deref().unwrap_or_default();
                if !state.credentials.verify(current, &user.password) {
                    return Err(ApiError::BadRequest("current password is incorrect".into()));
                }
            }

            let hash = state.credentials.hash(&req.new_password)?;
            state.db.set_password_hash(&target, &hash)?;
            Ok(())
        })
        .await?;

    if is_self {
        info!("{} changed their password", claims.username);
    } else {
        info!("{} reset the password of user {}", claims.username, id);
    }
    Ok(Json(StatusMessage::new("Password updated successfully")))
}

/// PUT /api/users/{id}/role — admin only, and not on themselves.
pub async fn set_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    require_admin(&claims)?;
    if claims.sub == id {
        return Err(ApiError::BadRequest("admins cannot change their own role".into()));
    }

    let role = req.role;
    let row = state
        .run_blocking(move |state| {
            state
                .db
                .set_role(&id, role.as_str())?
                .ok_or(ApiError::NotFound("user"))
        })
        .await?;

    info!("{} set role of {} to {}", claims.username, row.username, role);
    Ok(Json(row.into()))
}
