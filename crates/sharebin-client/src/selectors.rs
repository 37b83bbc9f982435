//! Derived views over the slices.

use std::collections::BTreeSet;

use sharebin_types::{Blog, Chat, DEFAULT_ROOM, Paste, PublicUser};

const PREVIEW_CHARS: usize = 150;

/// Items with a title, body and tags that the search box looks through.
pub trait Searchable {
    fn title(&self) -> &str;
    fn content(&self) -> &str;
    fn tags(&self) -> &[String];

    /// Case-insensitive substring match on title, content or any tag.
    /// `needle` must already be lower-cased.
    fn matches(&self, needle: &str) -> bool {
        self.title().to_lowercase().contains(needle)
            || self.content().to_lowercase().contains(needle)
            || self.tags().iter().any(|t| t.to_lowercase().contains(needle))
    }
}

impl Searchable for Paste {
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Searchable for Blog {
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// List-page filter: a blank query keeps everything.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    items.iter().filter(|item| item.matches(&needle)).collect()
}

/// Site-wide search results. A blank query finds nothing.
#[derive(Debug, Default)]
pub struct SearchResults<'a> {
    pub pastes: Vec<&'a Paste>,
    pub blogs: Vec<&'a Blog>,
}

impl<'a> SearchResults<'a> {
    pub fn find(pastes: &'a [Paste], blogs: &'a [Blog], query: &str) -> Self {
        if query.trim().is_empty() {
            return Self::default();
        }
        Self {
            pastes: filter(pastes, query),
            blogs: filter(blogs, query),
        }
    }

    pub fn total(&self) -> usize {
        self.pastes.len() + self.blogs.len()
    }
}

/// First 150 characters, with an ellipsis when cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

/// Admins may modify anything; everyone else only what they own.
pub fn can_modify(user: Option<&PublicUser>, owner_id: &str) -> bool {
    user.is_some_and(|u| u.is_admin() || u.id == owner_id)
}

/// Trimmed, lower-cased, whitespace runs collapsed to `-`.
pub fn normalize_room_name(raw: &str) -> Option<String> {
    let name = raw
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    (!name.is_empty()).then_some(name)
}

/// Every room seen in `chats`, plus `general` and the remembered names, sorted.
pub fn available_rooms(chats: &[Chat], remembered: &[String]) -> Vec<String> {
    let mut rooms: BTreeSet<&str> = chats.iter().map(|c| c.room_id.as_str()).collect();
    rooms.insert(DEFAULT_ROOM);
    rooms.extend(remembered.iter().map(String::as_str));
    rooms.into_iter().map(str::to_string).collect()
}

/// Messages of one room, oldest first.
pub fn room_chats<'a>(chats: &'a [Chat], room: &str) -> Vec<&'a Chat> {
    let mut out: Vec<&Chat> = chats.iter().filter(|c| c.room_id == room).collect();
    out.sort_by_key(|c| c.created_at);
    out
}

pub fn room_message_count(chats: &[Chat], room: &str) -> usize {
    chats.iter().filter(|c| c.room_id == room).count()
}
