use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info};
use uuid::Uuid;

use sharebin_db::models::{PasteRow, now_timestamp};
use sharebin_types::Paste;
use sharebin_types::api::{Claims, ContentInput, StatusMessage};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_pastes(State(state): State<AppState>) -> Result<Json<Vec<Paste>>, ApiError> {
    let rows = state.run_blocking(|state| Ok(state.db.list_pastes()?)).await?;
    Ok(Json(rows.into_iter().map(Paste::from).collect()))
}

/// The caller becomes the owner regardless of any `userId` in the body.
pub async fn create_paste(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentInput>,
) -> Result<(StatusCode, Json<Paste>), ApiError> {
    let row = PasteRow {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        content: req.content,
        tags: req.tags,
        user_id: claims.sub,
        created_at: now_timestamp(),
    };

    let row = state
        .run_blocking(move |state| {
            state.db.insert_paste(&row)?;
            Ok(row)
        })
        .await?;

    info!("Paste {} created by {}", row.id, claims.username);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// Responds with `null` when the id does not exist.
pub async fn update_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentInput>,
) -> Result<Json<Option<Paste>>, ApiError> {
    let updated = state
        .run_blocking(move |state| {
            let Some(existing) = state.db.get_paste(&id)? else {
                return Ok(None);
            };
            if !claims.may_modify(&existing.user_id) {
                return Err(ApiError::Forbidden("only the owner or an admin may edit this paste"));
            }
            Ok(state.db.replace_paste(&id, &req.title, &req.content, &req.tags)?)
        })
        .await?;

    Ok(Json(updated.map(Paste::from)))
}

/// Deleting an unknown id still succeeds.
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StatusMessage>, ApiError> {
    state
        .run_blocking(move |state| {
            match state.db.get_paste(&id)? {
                Some(existing) if !claims.may_modify(&existing.user_id) => {
                    Err(ApiError::Forbidden("only the owner or an admin may delete this paste"))
                }
                Some(_) => {
                    state.db.delete_paste(&id)?;
                    Ok(())
                }
                None => {
                    debug!("Delete of unknown paste {}", id);
                    Ok(())
                }
            }
        })
        .await?;

    Ok(Json(StatusMessage::new("Paste deleted successfully")))
}
