use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info};
use uuid::Uuid;

use sharebin_db::models::{BlogRow, now_timestamp};
use sharebin_types::Blog;
use sharebin_types::api::{Claims, ContentInput, StatusMessage};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>, ApiError> {
    let rows = state.run_blocking(|state| Ok(state.db.list_blogs()?)).await?;
    Ok(Json(rows.into_iter().map(Blog::from).collect()))
}

/// The caller becomes the owner regardless of any `userId` in the body.
pub async fn create_blog(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentInput>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    let row = BlogRow {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        content: req.content,
        tags: req.tags,
        user_id: claims.sub,
        created_at: now_timestamp(),
        updated_at: None,
    };

    let row = state
        .run_blocking(move |state| {
            state.db.insert_blog(&row)?;
            Ok(row)
        })
        .await?;

    info!("Blog post {} created by {}", row.id, claims.username);
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// Responds with `null` when the id does not exist. Stamps `updatedAt`.
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ContentInput>,
) -> Result<Json<Option<Blog>>, ApiError> {
    let updated = state
        .run_blocking(move |state| {
            let Some(existing) = state.db.get_blog(&id)? else {
                return Ok(None);
            };
            if !claims.may_modify(&existing.user_id) {
                return Err(ApiError::Forbidden("only the owner or an admin may edit this blog post"));
            }
            Ok(state.db.replace_blog(&id, &req.title, &req.content, &req.tags)?)
        })
        .await?;

    Ok(Json(updated.map(Blog::from)))
}

/// Deleting an unknown id still succeeds.
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StatusMessage>, ApiError> {
    state
        .run_blocking(move |state| {
            match state.db.get_blog(&id)? {
                Some(existing) if !claims.may_modify(&existing.user_id) => {
                    Err(ApiError::Forbidden("only the owner or an admin may delete this blog post"))
                }
                Some(_) => {
                    state.db.delete_blog(&id)?;
                    Ok(())
                }
                None => {
                    debug!("Delete of unknown blog post {}", id);
                    Ok(())
                }
            }
        })
        .await?;

    Ok(Json(StatusMessage::new("Blog deleted successfully")))
}
