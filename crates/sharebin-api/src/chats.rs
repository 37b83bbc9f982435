use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sharebin_db::models::{ChatRow, now_timestamp};
use sharebin_types::Chat;
use sharebin_types::api::{ChatInput, ChatUpdate, Claims, StatusMessage};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_admin;

pub async fn list_chats(State(state): State<AppState>) -> Result<Json<Vec<Chat>>, ApiError> {
    let rows = state.run_blocking(|state| Ok(state.db.list_chats()?)).await?;
    Ok(Json(rows.into_iter().map(Chat::from).collect()))
}

/// POST /api/chats — author fields come from the token. A `replyTo` naming
/// an existing chat gets that chat's text and author copied onto the new one.
pub async fn send_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChatInput>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let row = ChatRow {
        id: Uuid::new_v4().to_string(),
        user_id: claims.sub,
        username: claims.username,
        message: req.message,
        room_id: req.room_id,
        reply_to: req.reply_to.filter(|id| !id.is_empty()),
        reply_to_message: None,
        reply_to_username: None,
        created_at: now_timestamp(),
    };

    let chat = state.run_blocking(move |state| Ok(state.db.insert_chat(row)?)).await?;

    if let (Some(parent), None) = (&chat.reply_to, &chat.reply_to_message) {
        warn!("Chat {} replies to unknown chat {}", chat.id, parent);
    }
    debug!("Chat {} posted to '{}' by {}", chat.id, chat.room_id, chat.username);

    Ok((StatusCode::CREATED, Json(chat.into())))
}

/// Replaces the text, and the room when one is given. Responds with `null`
/// for an unknown id.
pub async fn update_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChatUpdate>,
) -> Result<Json<Option<Chat>>, ApiError> {
    let updated = state
        .run_blocking(move |state| {
            let Some(existing) = state.db.get_chat(&id)? else {
                return Ok(None);
            };
            if !claims.may_modify(&existing.user_id) {
                return Err(ApiError::Forbidden("only the author or an admin may edit this message"));
            }
            let room_id = req.room_id.unwrap_or(existing.room_id);
            Ok(state.db.replace_chat(&id, &req.message, &room_id)?)
        })
        .await?;

    Ok(Json(updated.map(Chat::from)))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StatusMessage>, ApiError> {
    state
        .run_blocking(move |state| {
            let Some(existing) = state.db.get_chat(&id)? else {
                debug!("Delete of unknown chat {}", id);
                return Ok(());
            };
            if !claims.may_modify(&existing.user_id) {
                return Err(ApiError::Forbidden("only the author or an admin may delete this message"));
            }
            state.db.delete_chat(&id)?;
            Ok(())
        })
        .await?;

    Ok(Json(StatusMessage::new("Chat deleted successfully")))
}

/// DELETE /api/chat-rooms/{room_id} — removes every message in the room.
/// Admin only.
pub async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StatusMessage>, ApiError> {
    require_admin(&claims)?;

    let room = room_id.clone();
    let removed = state.run_blocking(move |state| Ok(state.db.delete_room(&room)?)).await?;

    info!("{} deleted room '{}' ({} messages)", claims.username, room_id, removed);
    Ok(Json(StatusMessage::new(format!(
        "Room '{}' and its messages deleted.",
        room_id
    ))))
}
