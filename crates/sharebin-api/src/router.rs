use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{blogs, chats, pastes, users};

/// Reads and sign-up/login are public; every mutation goes through
/// `require_auth` and the per-handler ownership or role checks.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/login", post(auth::login))
        .route("/api/users", post(users::create_user))
        .route("/api/pastes", get(pastes::list_pastes))
        .route("/api/blogs", get(blogs::list_blogs))
        .route("/api/chats", get(chats::list_chats))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/pastes", post(pastes::create_paste))
        .route("/api/pastes/{id}", put(pastes::update_paste).delete(pastes::delete_paste))
        .route("/api/blogs", post(blogs::create_blog))
        .route("/api/blogs/{id}", put(blogs::update_blog).delete(blogs::delete_blog))
        .route("/api/chats", post(chats::send_chat))
        .route("/api/chats/{id}", put(chats::update_chat).delete(chats::delete_chat))
        .route("/api/chat-rooms/{room_id}", delete(chats::delete_room))
        .route("/api/users", get(users::list_users))
        .route("/api/users/{id}", put(users::update_profile))
        .route("/api/users/{id}/password", put(users::change_password))
        .route("/api/users/{id}/role", put(users::set_role))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
