//! Thin reqwest wrapper over the sharebin REST API.

use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use sharebin_types::api::{
    ChangePasswordRequest, ErrorBody, LoginRequest, LoginResponse, RegisterRequest,
    SetRoleRequest, StatusMessage, UpdateProfileRequest,
};
use sharebin_types::{PublicUser, Role};

use crate::error::ClientError;

pub const PASTES: &str = "pastes";
pub const BLOGS: &str = "blogs";
pub const CHATS: &str = "chats";

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
            token: None,
        })
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // -- Collections --

    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, ClientError> {
        let url = self.url(&["api", collection])?;
        self.send(self.client.get(url)).await
    }

    pub async fn create<B, T>(&self, collection: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(&["api", collection])?;
        self.send(self.client.post(url).json(body)).await
    }

    /// `None` when the server no longer has a document with this id.
    pub async fn update<B, T>(
        &self,
        collection: &str,
        id: &str,
        body: &B,
    ) -> Result<Option<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(&["api", collection, id])?;
        self.send(self.client.put(url).json(body)).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<StatusMessage, ClientError> {
        let url = self.url(&["api", collection, id])?;
        self.send(self.client.delete(url)).await
    }

    pub async fn delete_room(&self, room_id: &str) -> Result<StatusMessage, ClientError> {
        let url = self.url(&["api", "chat-rooms", room_id])?;
        self.send(self.client.delete(url)).await
    }

    // -- Auth & users --

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let url = self.url(&["api", "login"])?;
        self.send(self.client.post(url).json(req)).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<PublicUser, ClientError> {
        let url = self.url(&["api", "users"])?;
        self.send(self.client.post(url).json(req)).await
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, ClientError> {
        let url = self.url(&["api", "users"])?;
        self.send(self.client.get(url)).await
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        req: &UpdateProfileRequest,
    ) -> Result<PublicUser, ClientError> {
        let url = self.url(&["api", "users", user_id])?;
        self.send(self.client.put(url).json(req)).await
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        req: &ChangePasswordRequest,
    ) -> Result<StatusMessage, ClientError> {
        let url = self.url(&["api", "users", user_id, "password"])?;
        self.send(self.client.put(url).json(req)).await
    }

    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<PublicUser, ClientError> {
        let url = self.url(&["api", "users", user_id, "role"])?;
        self.send(self.client.put(url).json(&SetRoleRequest { role }))
            .await
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    if text.is_empty() {
                        status.to_string()
                    } else {
                        text
                    }
                });
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}
