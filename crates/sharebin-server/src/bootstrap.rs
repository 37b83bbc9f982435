use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use sharebin_api::AppStateInner;
use sharebin_db::models::{UserRow, now_timestamp};
use sharebin_types::Role;

use crate::config::AdminSeed;

/// Create the configured admin account unless a user with that name exists.
/// Returns whether an account was created.
pub fn ensure_admin(state: &AppStateInner, seed: &AdminSeed) -> Result<bool> {
    if state.db.get_user_by_username(&seed.username)?.is_some() {
        return Ok(false);
    }

    let row = UserRow {
        id: Uuid::new_v4().to_string(),
        username: seed.username.clone(),
        email: seed.email.clone(),
        password: state.credentials.hash(&seed.password)?,
        name: None,
        role: Role::Admin.to_string(),
        created_at: now_timestamp(),
    };
    state.db.create_user(&row)?;

    info!("Created admin account '{}'", seed.username);
    Ok(true)
}
