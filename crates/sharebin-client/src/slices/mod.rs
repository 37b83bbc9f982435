mod auth;
mod chat;
mod collection;

pub use auth::AuthSlice;
pub use chat::ChatSlice;
pub use collection::{CollectionSlice, Document};
