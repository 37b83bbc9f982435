/// Database row types. These map directly to SQLite rows and are converted
/// into the `sharebin-types` models at the API boundary.
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use sharebin_types::{Blog, Chat, Paste, PublicUser, Role};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: String,
}

pub struct PasteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub user_id: String,
    pub created_at: String,
}

pub struct BlogRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct ChatRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub message: String,
    pub room_id: String,
    pub reply_to: Option<String>,
    pub reply_to_message: Option<String>,
    pub reply_to_username: Option<String>,
    pub created_at: String,
}

/// Timestamp format written by every insert.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_timestamp(raw: &str, id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by sqlite's datetime('now') have no timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on document '{}': {}", raw, id, e);
            DateTime::default()
        })
}

pub(crate) fn decode_tags(raw: &str, id: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt tags '{}' on document '{}': {}", raw, id, e);
        Vec::new()
    })
}

impl UserRow {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|e| {
            warn!("User '{}': {}, treating as user", self.id, e);
            Role::User
        })
    }
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        let role = row.role();
        let created_at = parse_timestamp(&row.created_at, &row.id);
        Self {
            name: row
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| row.username.clone()),
            id: row.id,
            username: row.username,
            role,
            email: row.email,
            created_at,
        }
    }
}

impl From<PasteRow> for Paste {
    fn from(row: PasteRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, &row.id);
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            tags: row.tags,
            created_at,
            user_id: row.user_id,
        }
    }
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, &row.id);
        let updated_at = row
            .updated_at
            .as_deref()
            .map(|raw| parse_timestamp(raw, &row.id));
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            tags: row.tags,
            user_id: row.user_id,
            created_at,
            updated_at,
        }
    }
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        let created_at = parse_timestamp(&row.created_at, &row.id);
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            message: row.message,
            room_id: row.room_id,
            reply_to: row.reply_to,
            reply_to_message: row.reply_to_message,
            reply_to_username: row.reply_to_username,
            created_at,
        }
    }
}
