pub mod auth;
pub mod blogs;
pub mod chats;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod pastes;
pub mod router;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::build_router;
