use serde::{Deserialize, Serialize};

use crate::models::{DEFAULT_ROOM, PublicUser, Role};

// -- JWT Claims --

/// JWT claims issued at login and checked by the API middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Owner-or-admin check used by every per-document mutation.
    pub fn may_modify(&self, owner_id: &str) -> bool {
        self.is_admin() || self.sub == owner_id
    }
}

// -- Auth --

/// The client sends the same identifier as both `username` and `email`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

// -- Users --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Required unless an admin is resetting someone else's password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

// -- Content --

/// Body for creating or replacing a paste or blog post. Missing fields are
/// stored empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_room")]
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Body for editing a chat message. An absent `roomId` keeps the message
/// where it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUpdate {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

fn default_room() -> String {
    DEFAULT_ROOM.to_string()
}

impl Default for ChatInput {
    fn default() -> Self {
        Self {
            message: String::new(),
            room_id: default_room(),
            reply_to: None,
        }
    }
}

// -- Responses --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_input_defaults_to_general_room() {
        let input: ChatInput = serde_json::from_str(r#"{"message":"hey"}"#).unwrap();
        assert_eq!(input.room_id, "general");
        assert!(input.reply_to.is_none());
    }

    #[test]
    fn chat_update_room_is_optional() {
        let update: ChatUpdate = serde_json::from_str(r#"{"message":"edited"}"#).unwrap();
        assert_eq!(update.message, "edited");
        assert!(update.room_id.is_none());
    }

    #[test]
    fn claims_owner_or_admin() {
        let claims = Claims {
            sub: "u1".into(),
            username: "alice".into(),
            role: Role::User,
            exp: 0,
        };
        assert!(claims.may_modify("u1"));
        assert!(!claims.may_modify("u2"));

        let admin = Claims { role: Role::Admin, ..claims };
        assert!(admin.may_modify("u2"));
    }

    #[test]
    fn content_input_tolerates_missing_fields() {
        let input: ContentInput = serde_json::from_str(r#"{"title":"only"}"#).unwrap();
        assert_eq!(input.title, "only");
        assert!(input.content.is_empty());
        assert!(input.tags.is_empty());
    }
}
