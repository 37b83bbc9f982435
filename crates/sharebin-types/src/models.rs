use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Room every chat lands in when the client does not name one.
pub const DEFAULT_ROOM: &str = "general";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paste {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(alias = "authorId")]
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A chat message. `reply_to_message` and `reply_to_username` are copies of
/// the parent taken when the reply was posted and are never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(alias = "_id")]
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub message: String,
    pub room_id: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub reply_to_message: Option<String>,
    #[serde(default)]
    pub reply_to_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User as exposed over the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl PublicUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_and_displays_lowercase() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn chat_accepts_legacy_underscore_id() {
        let raw = r#"{
            "_id": "c1",
            "userId": "u1",
            "username": "alice",
            "message": "hi",
            "roomId": "general",
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;
        let chat: Chat = serde_json::from_str(raw).unwrap();
        assert_eq!(chat.id, "c1");
        assert!(chat.reply_to.is_none());
    }

    #[test]
    fn blog_accepts_author_id_alias() {
        let raw = r#"{
            "id": "b1",
            "title": "t",
            "content": "c",
            "authorId": "u9",
            "createdAt": "2024-05-01T10:00:00Z"
        }"#;
        let blog: Blog = serde_json::from_str(raw).unwrap();
        assert_eq!(blog.user_id, "u9");
        assert!(blog.tags.is_empty());
        assert!(blog.updated_at.is_none());
    }
}
