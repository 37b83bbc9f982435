//! Client-side state for sharebin: local mirrors of the server collections,
//! the signed-in session, chat rooms, and the selectors views read from.
//!
//! Every mutation goes to the server first and is committed to the local
//! mirror only once the server has accepted it.

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod selectors;
pub mod slices;
pub mod storage;
pub mod store;
pub mod validate;

pub use config::ClientConfig;
pub use error::ClientError;
pub use store::AppStore;
