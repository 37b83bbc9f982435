use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use sharebin_types::api::{
    ChangePasswordRequest, ChatInput, ChatUpdate, LoginRequest, UpdateProfileRequest,
};
use sharebin_types::{Blog, Chat, Paste, PublicUser, Role};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{ApiClient, BLOGS, CHATS, PASTES};
use crate::selectors::can_modify;
use crate::slices::{AuthSlice, ChatSlice, CollectionSlice, Document};
use crate::storage::{CHAT_ROOMS, DeviceStorage};
use crate::validate::{
    self, ContentForm, ContentKind, PasswordChangeForm, SignUpForm, ValidationError,
};

/// All client state in one place. Every mutating method talks to the server
/// first and only touches local state once the server has said yes; on
/// failure the error is logged and handed back with local state unchanged.
pub struct AppStore {
    api: ApiClient,
    storage: DeviceStorage,
    auth: AuthSlice,
    pastes: CollectionSlice<Paste>,
    blogs: CollectionSlice<Blog>,
    chats: ChatSlice,
}

impl AppStore {
    pub fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config.api_url)?;
        let storage = DeviceStorage::open(&config.state_dir)?;
        Self::hydrate(api, storage)
    }

    /// Restores the session and remembered rooms from device storage.
    pub fn hydrate(mut api: ApiClient, storage: DeviceStorage) -> Result<Self, ClientError> {
        let auth = AuthSlice::hydrate(&storage)?;
        let rooms: Vec<String> = storage.get(CHAT_ROOMS)?.unwrap_or_default();
        api.set_token(auth.token().map(str::to_string));
        Ok(Self {
            api,
            storage,
            auth,
            pastes: CollectionSlice::default(),
            blogs: CollectionSlice::default(),
            chats: ChatSlice::new(rooms),
        })
    }

    pub fn auth(&self) -> &AuthSlice {
        &self.auth
    }

    pub fn pastes(&self) -> &CollectionSlice<Paste> {
        &self.pastes
    }

    pub fn blogs(&self) -> &CollectionSlice<Blog> {
        &self.blogs
    }

    pub fn chats(&self) -> &ChatSlice {
        &self.chats
    }

    pub fn can_modify<T: Document>(&self, item: &T) -> bool {
        can_modify(self.auth.current_user(), item.owner_id())
    }

    /// Fetches all three collections. A failed fetch leaves that slice as it
    /// was; the others still load. Returns the first failure.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let failures = [
            fetch_into(&self.api, PASTES, &mut self.pastes).await,
            fetch_into(&self.api, BLOGS, &mut self.blogs).await,
            fetch_into(&self.api, CHATS, self.chats.messages_mut()).await,
        ];
        match failures.into_iter().flatten().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // -- Session --

    /// `identifier` may be a username or an email.
    pub async fn login(&mut self, identifier: &str, password: &str) -> Result<PublicUser, ClientError> {
        let result = async {
            let req = LoginRequest {
                username: identifier.to_string(),
                email: identifier.to_string(),
                password: password.to_string(),
            };
            let session = self.api.login(&req).await?;
            let user = session.user.clone();
            self.auth.login(session, &self.storage)?;
            self.api.set_token(self.auth.token().map(str::to_string));
            info!("Logged in as {}", user.username);
            Ok::<_, ClientError>(user)
        }
        .await;
        logged("log in", result)
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.api.set_token(None);
        logged("log out", self.auth.logout(&self.storage))
    }

    /// Creates an account. Does not sign in.
    pub async fn register(&mut self, form: &SignUpForm) -> Result<PublicUser, ClientError> {
        let result = async {
            let req = form.validate()?;
            self.api.register(&req).await
        }
        .await;
        logged("sign up", result)
    }

    // -- Pastes --

    pub async fn add_paste(&mut self, form: &ContentForm) -> Result<Paste, ClientError> {
        let result = async {
            self.require_auth()?;
            let input = form.validate(ContentKind::Paste)?;
            create_in(&self.api, PASTES, &mut self.pastes, &input).await
        }
        .await;
        logged("add paste", result)
    }

    pub async fn update_paste(&mut self, id: &str, form: &ContentForm) -> Result<Option<Paste>, ClientError> {
        let result = async {
            self.require_owner(&self.pastes, id, "edit this paste")?;
            let input = form.validate(ContentKind::Paste)?;
            update_in(&self.api, PASTES, &mut self.pastes, id, &input).await
        }
        .await;
        logged("update paste", result)
    }

    pub async fn delete_paste(&mut self, id: &str) -> Result<(), ClientError> {
        let result = async {
            self.require_owner(&self.pastes, id, "delete this paste")?;
            delete_in(&self.api, PASTES, &mut self.pastes, id).await
        }
        .await;
        logged("delete paste", result)
    }

    // -- Blogs --

    pub async fn add_blog(&mut self, form: &ContentForm) -> Result<Blog, ClientError> {
        let result = async {
            self.require_auth()?;
            let input = form.validate(ContentKind::Blog)?;
            create_in(&self.api, BLOGS, &mut self.blogs, &input).await
        }
        .await;
        logged("add blog", result)
    }

    pub async fn update_blog(&mut self, id: &str, form: &ContentForm) -> Result<Option<Blog>, ClientError> {
        let result = async {
            self.require_owner(&self.blogs, id, "edit this blog")?;
            let input = form.validate(ContentKind::Blog)?;
            update_in(&self.api, BLOGS, &mut self.blogs, id, &input).await
        }
        .await;
        logged("update blog", result)
    }

    pub async fn delete_blog(&mut self, id: &str) -> Result<(), ClientError> {
        let result = async {
            self.require_owner(&self.blogs, id, "delete this blog")?;
            delete_in(&self.api, BLOGS, &mut self.blogs, id).await
        }
        .await;
        logged("delete blog", result)
    }

    // -- Chat --

    pub fn switch_room(&mut self, room: &str) {
        self.chats.switch_room(room);
    }

    /// Posts to the open room, optionally as a reply.
    pub async fn send_chat(&mut self, message: &str, reply_to: Option<&str>) -> Result<Chat, ClientError> {
        let result = async {
            self.require_auth()?;
            let message = message.trim();
            if message.is_empty() {
                return Err(ValidationError::EmptyMessage.into());
            }
            let input = ChatInput {
                message: message.to_string(),
                room_id: self.chats.current_room().to_string(),
                reply_to: reply_to.map(str::to_string),
            };
            create_in(&self.api, CHATS, self.chats.messages_mut(), &input).await
        }
        .await;
        logged("send message", result)
    }

    /// Edits the text of a message. Its room and reply snapshot stay as they were.
    pub async fn update_chat(&mut self, id: &str, message: &str) -> Result<Option<Chat>, ClientError> {
        let result = async {
            self.require_owner(self.chats.messages(), id, "edit this message")?;
            let message = message.trim();
            if message.is_empty() {
                return Err(ValidationError::EmptyMessage.into());
            }
            let input = ChatUpdate {
                message: message.to_string(),
                room_id: None,
            };
            update_in(&self.api, CHATS, self.chats.messages_mut(), id, &input).await
        }
        .await;
        logged("update message", result)
    }

    pub async fn delete_chat(&mut self, id: &str) -> Result<(), ClientError> {
        let result = async {
            self.require_owner(self.chats.messages(), id, "delete this message")?;
            delete_in(&self.api, CHATS, self.chats.messages_mut(), id).await
        }
        .await;
        logged("delete message", result)
    }

    /// Remembers a new room and opens it. Nothing is sent to the server until
    /// the first message is posted there.
    pub fn create_room(&mut self, raw_name: &str) -> Result<String, ClientError> {
        let result = (|| {
            let name = self.chats.add_room(raw_name)?;
            self.storage.set(CHAT_ROOMS, self.chats.custom_rooms())?;
            self.chats.switch_room(&name);
            Ok::<_, ClientError>(name)
        })();
        logged("create room", result)
    }

    /// Admin only. Returns how many local messages went with the room.
    pub async fn delete_room(&mut self, room_id: &str) -> Result<usize, ClientError> {
        let result = async {
            self.require_admin("delete rooms")?;
            self.api.delete_room(room_id).await?;
            let removed = self.chats.drop_room(room_id);
            self.storage.set(CHAT_ROOMS, self.chats.custom_rooms())?;
            info!("Deleted room '{}' ({} messages)", room_id, removed);
            Ok::<_, ClientError>(removed)
        }
        .await;
        logged("delete room", result)
    }

    // -- Account & administration --

    pub async fn update_profile(
        &mut self,
        user_id: &str,
        req: &UpdateProfileRequest,
    ) -> Result<PublicUser, ClientError> {
        let result = async {
            self.require_auth()?;
            if !can_modify(self.auth.current_user(), user_id) {
                return Err(ClientError::NotPermitted("update this profile"));
            }
            let user = self.api.update_profile(user_id, req).await?;
            self.auth.refresh_user(&user, &self.storage)?;
            Ok::<_, ClientError>(user)
        }
        .await;
        logged("update profile", result)
    }

    /// Changes the signed-in user's own password.
    pub async fn change_password(&mut self, form: &PasswordChangeForm) -> Result<(), ClientError> {
        let result = async {
            let user_id = self.auth.user_id().ok_or(ClientError::NotAuthenticated)?;
            form.validate()?;
            let req = ChangePasswordRequest {
                current_password: Some(form.current_password.clone()),
                new_password: form.new_password.clone(),
            };
            self.api.change_password(user_id, &req).await?;
            Ok::<_, ClientError>(())
        }
        .await;
        logged("change password", result)
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, ClientError> {
        let result = async {
            self.require_admin("list users")?;
            self.api.list_users().await
        }
        .await;
        logged("list users", result)
    }

    /// Admin sign-up on someone's behalf, with the role of the admin's choosing.
    pub async fn add_user(&mut self, form: &SignUpForm, role: Role) -> Result<PublicUser, ClientError> {
        let result = async {
            self.require_admin("add users")?;
            let mut req = form.validate()?;
            req.role = Some(role);
            self.api.register(&req).await
        }
        .await;
        logged("add user", result)
    }

    pub async fn set_role(&mut self, user_id: &str, role: Role) -> Result<PublicUser, ClientError> {
        let result = async {
            self.require_admin("change roles")?;
            let user = self.api.set_role(user_id, role).await?;
            self.auth.refresh_user(&user, &self.storage)?;
            Ok::<_, ClientError>(user)
        }
        .await;
        logged("change role", result)
    }

    pub async fn reset_password(&mut self, user_id: &str, new_password: &str) -> Result<(), ClientError> {
        let result = async {
            self.require_admin("reset passwords")?;
            validate::validate_password(new_password)?;
            let req = ChangePasswordRequest {
                current_password: None,
                new_password: new_password.to_string(),
            };
            self.api.change_password(user_id, &req).await?;
            Ok::<_, ClientError>(())
        }
        .await;
        logged("reset password", result)
    }

    fn require_auth(&self) -> Result<(), ClientError> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }

    fn require_admin(&self, action: &'static str) -> Result<(), ClientError> {
        self.require_auth()?;
        if self.auth.is_admin() {
            Ok(())
        } else {
            Err(ClientError::NotPermitted(action))
        }
    }

    /// Documents we have not seen locally are left for the server to judge.
    fn require_owner<T: Document>(
        &self,
        slice: &CollectionSlice<T>,
        id: &str,
        action: &'static str,
    ) -> Result<(), ClientError> {
        self.require_auth()?;
        match slice.get(id) {
            Some(item) if !self.can_modify(item) => Err(ClientError::NotPermitted(action)),
            _ => Ok(()),
        }
    }
}

fn logged<T>(action: &str, result: Result<T, ClientError>) -> Result<T, ClientError> {
    if let Err(e) = &result {
        warn!("Failed to {}: {}", action, e);
    }
    result
}

async fn fetch_into<T>(
    api: &ApiClient,
    collection: &str,
    slice: &mut CollectionSlice<T>,
) -> Option<ClientError>
where
    T: Document + DeserializeOwned,
{
    match api.list(collection).await {
        Ok(items) => {
            slice.set_all(items);
            None
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", collection, e);
            Some(e)
        }
    }
}

async fn create_in<T, B>(
    api: &ApiClient,
    collection: &str,
    slice: &mut CollectionSlice<T>,
    body: &B,
) -> Result<T, ClientError>
where
    T: Document + DeserializeOwned,
    B: Serialize,
{
    let doc: T = api.create(collection, body).await?;
    slice.append(doc.clone());
    Ok(doc)
}

/// A `null` reply means the document is gone server-side, so the stale local
/// copy is dropped too.
async fn update_in<T, B>(
    api: &ApiClient,
    collection: &str,
    slice: &mut CollectionSlice<T>,
    id: &str,
    body: &B,
) -> Result<Option<T>, ClientError>
where
    T: Document + DeserializeOwned,
    B: Serialize,
{
    match api.update::<B, T>(collection, id, body).await? {
        Some(doc) => {
            slice.replace(doc.clone());
            Ok(Some(doc))
        }
        None => {
            slice.remove(id);
            Ok(None)
        }
    }
}

async fn delete_in<T: Document>(
    api: &ApiClient,
    collection: &str,
    slice: &mut CollectionSlice<T>,
    id: &str,
) -> Result<(), ClientError> {
    api.delete(collection, id).await?;
    slice.remove(id);
    Ok(())
}
