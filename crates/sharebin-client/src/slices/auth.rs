use sharebin_types::PublicUser;
use sharebin_types::api::LoginResponse;

use crate::error::ClientError;
use crate::storage::{CURRENT_USER, DeviceStorage, IS_AUTHENTICATED, TOKEN};

/// The signed-in session, mirrored to device storage.
#[derive(Debug, Clone, Default)]
pub struct AuthSlice {
    current_user: Option<PublicUser>,
    is_authenticated: bool,
    token: Option<String>,
}

impl AuthSlice {
    /// Restores a previous session. A partial one (flag without user or
    /// token) counts as signed out.
    pub fn hydrate(storage: &DeviceStorage) -> Result<Self, ClientError> {
        let current_user: Option<PublicUser> = storage.get(CURRENT_USER)?;
        let token: Option<String> = storage.get(TOKEN)?;
        let flag = storage.get::<bool>(IS_AUTHENTICATED)?.unwrap_or(false);

        if flag && current_user.is_some() && token.is_some() {
            Ok(Self {
                current_user,
                is_authenticated: true,
                token,
            })
        } else {
            Ok(Self::default())
        }
    }

    pub fn login(&mut self, session: LoginResponse, storage: &DeviceStorage) -> Result<(), ClientError> {
        storage.set(CURRENT_USER, &session.user)?;
        storage.set(IS_AUTHENTICATED, &true)?;
        storage.set(TOKEN, &session.token)?;

        self.current_user = Some(session.user);
        self.token = Some(session.token);
        self.is_authenticated = true;
        Ok(())
    }

    pub fn logout(&mut self, storage: &DeviceStorage) -> Result<(), ClientError> {
        *self = Self::default();
        storage.remove(CURRENT_USER)?;
        storage.remove(IS_AUTHENTICATED)?;
        storage.remove(TOKEN)?;
        Ok(())
    }

    /// Refreshes the stored profile if `user` is the one signed in.
    pub fn refresh_user(&mut self, user: &PublicUser, storage: &DeviceStorage) -> Result<(), ClientError> {
        if self.user_id() != Some(user.id.as_str()) {
            return Ok(());
        }
        storage.set(CURRENT_USER, user)?;
        self.current_user = Some(user.clone());
        Ok(())
    }

    pub fn current_user(&self) -> Option<&PublicUser> {
        self.current_user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.current_user.as_ref().map(|u| u.id.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(PublicUser::is_admin)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
