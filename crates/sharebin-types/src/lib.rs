pub mod api;
pub mod models;

pub use models::{Blog, Chat, DEFAULT_ROOM, Paste, PublicUser, Role};
