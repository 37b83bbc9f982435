use sharebin_types::{Chat, DEFAULT_ROOM};

use crate::error::ClientError;
use crate::selectors;
use crate::slices::CollectionSlice;
use crate::validate::ValidationError;

/// Chat messages of every room, plus which room is open and the room names
/// the user created that may not have messages yet.
#[derive(Debug, Clone)]
pub struct ChatSlice {
    messages: CollectionSlice<Chat>,
    current_room: String,
    custom_rooms: Vec<String>,
}

impl Default for ChatSlice {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ChatSlice {
    pub fn new(mut custom_rooms: Vec<String>) -> Self {
        custom_rooms.sort();
        custom_rooms.dedup();
        Self {
            messages: CollectionSlice::default(),
            current_room: DEFAULT_ROOM.to_string(),
            custom_rooms,
        }
    }

    pub fn messages(&self) -> &CollectionSlice<Chat> {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut CollectionSlice<Chat> {
        &mut self.messages
    }

    pub fn current_room(&self) -> &str {
        &self.current_room
    }

    pub fn switch_room(&mut self, room: &str) {
        self.current_room = room.to_string();
    }

    pub fn custom_rooms(&self) -> &[String] {
        &self.custom_rooms
    }

    pub fn rooms(&self) -> Vec<String> {
        selectors::available_rooms(self.messages.items(), &self.custom_rooms)
    }

    /// Messages in the open room, oldest first.
    pub fn room_chats(&self) -> Vec<&Chat> {
        selectors::room_chats(self.messages.items(), &self.current_room)
    }

    /// Remembers a new room and returns its normalised name.
    pub fn add_room(&mut self, raw: &str) -> Result<String, ClientError> {
        let name = selectors::normalize_room_name(raw).ok_or(ValidationError::EmptyRoomName)?;
        if self.rooms().contains(&name) {
            return Err(ClientError::RoomExists(name));
        }
        let idx = self.custom_rooms.partition_point(|r| r < &name);
        self.custom_rooms.insert(idx, name.clone());
        Ok(name)
    }

    /// Forgets a room and its messages. Falls back to `general` if it was open.
    pub fn drop_room(&mut self, room: &str) -> usize {
        self.custom_rooms.retain(|r| r != room);
        if self.current_room == room {
            self.current_room = DEFAULT_ROOM.to_string();
        }
        self.messages.remove_where(|c| c.room_id == room)
    }
}
