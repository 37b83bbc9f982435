use crate::Database;
use crate::models::{BlogRow, ChatRow, PasteRow, UserRow, decode_tags, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

const USER_COLUMNS: &str = "id, username, email, password, name, role, created_at";
const PASTE_COLUMNS: &str = "id, title, content, tags, user_id, created_at";
const BLOG_COLUMNS: &str = "id, title, content, tags, user_id, created_at, updated_at";
const CHAT_COLUMNS: &str = "id, user_id, username, message, room_id, reply_to, reply_to_message, reply_to_username, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, name, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.id,
                    user.username,
                    user.email,
                    user.password,
                    user.name,
                    user.role,
                    user.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid");
            query_all(conn, &sql, [], user_from_row)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 ORDER BY rowid LIMIT 1");
            query_one(conn, &sql, [username], user_from_row)
        })
    }

    /// Either identifier may hold either value: the login form sends one
    /// string as both `username` and `email`. Blank identifiers match
    /// nothing. Oldest match wins.
    pub fn find_user_for_login(&self, username: &str, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE username = NULLIF(?1, '') OR email = NULLIF(?2, '')
                    OR username = NULLIF(?2, '') OR email = NULLIF(?1, '')
                 ORDER BY rowid LIMIT 1"
            );
            query_one(conn, &sql, [username, email], user_from_row)
        })
    }

    /// Overwrites only the fields that are `Some`. Returns the updated row, or
    /// `None` if no such user exists.
    pub fn update_user_profile(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    username = COALESCE(?4, username)
                 WHERE id = ?1",
                params![id, name, email, username],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })
    }

    pub fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                params![id, password_hash],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_role(&self, id: &str, role: &str) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("UPDATE users SET role = ?2 WHERE id = ?1", params![id, role])?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })
    }

    // -- Pastes --

    pub fn list_pastes(&self) -> Result<Vec<PasteRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PASTE_COLUMNS} FROM pastes ORDER BY rowid");
            query_all(conn, &sql, [], paste_from_row)
        })
    }

    pub fn get_paste(&self, id: &str) -> Result<Option<PasteRow>> {
        self.with_conn(|conn| query_paste_by_id(conn, id))
    }

    pub fn insert_paste(&self, paste: &PasteRow) -> Result<()> {
        let tags = serde_json::to_string(&paste.tags)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO pastes (id, title, content, tags, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![paste.id, paste.title, paste.content, tags, paste.user_id, paste.created_at],
            )?;
            Ok(())
        })
    }

    /// Full replace of the content fields. Owner and creation time are kept.
    pub fn replace_paste(
        &self,
        id: &str,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<Option<PasteRow>> {
        let tags = serde_json::to_string(tags)?;
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE pastes SET title = ?2, content = ?3, tags = ?4 WHERE id = ?1",
                params![id, title, content, tags],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_paste_by_id(conn, id)
        })
    }

    pub fn delete_paste(&self, id: &str) -> Result<bool> {
        self.delete_by_id("pastes", id)
    }

    // -- Blogs --

    pub fn list_blogs(&self) -> Result<Vec<BlogRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs ORDER BY rowid");
            query_all(conn, &sql, [], blog_from_row)
        })
    }

    pub fn get_blog(&self, id: &str) -> Result<Option<BlogRow>> {
        self.with_conn(|conn| query_blog_by_id(conn, id))
    }

    pub fn insert_blog(&self, blog: &BlogRow) -> Result<()> {
        let tags = serde_json::to_string(&blog.tags)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO blogs (id, title, content, tags, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    blog.id,
                    blog.title,
                    blog.content,
                    tags,
                    blog.user_id,
                    blog.created_at,
                    blog.updated_at
                ],
            )?;
            Ok(())
        })
    }

    /// Full replace of the content fields; stamps `updated_at`.
    pub fn replace_blog(
        &self,
        id: &str,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<Option<BlogRow>> {
        let tags = serde_json::to_string(tags)?;
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE blogs SET title = ?2, content = ?3, tags = ?4, updated_at = ?5 WHERE id = ?1",
                params![id, title, content, tags, now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_blog_by_id(conn, id)
        })
    }

    pub fn delete_blog(&self, id: &str) -> Result<bool> {
        self.delete_by_id("blogs", id)
    }

    // -- Chats --

    pub fn list_chats(&self) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CHAT_COLUMNS} FROM chats ORDER BY rowid");
            query_all(conn, &sql, [], chat_from_row)
        })
    }

    pub fn get_chat(&self, id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| query_chat_by_id(conn, id))
    }

    /// Insert a chat, first copying the parent's text and author onto it when
    /// `reply_to` names an existing chat. An unknown parent leaves both
    /// snapshot fields empty. Lookup and insert share one transaction.
    pub fn insert_chat(&self, mut chat: ChatRow) -> Result<ChatRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            chat.reply_to_message = None;
            chat.reply_to_username = None;
            if let Some(parent_id) = chat.reply_to.as_deref() {
                if let Some(parent) = query_chat_by_id(&tx, parent_id)? {
                    chat.reply_to_message = Some(parent.message);
                    chat.reply_to_username = Some(parent.username);
                }
            }

            tx.execute(
                "INSERT INTO chats (id, user_id, username, message, room_id, reply_to, reply_to_message, reply_to_username, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    chat.id,
                    chat.user_id,
                    chat.username,
                    chat.message,
                    chat.room_id,
                    chat.reply_to,
                    chat.reply_to_message,
                    chat.reply_to_username,
                    chat.created_at
                ],
            )?;
            tx.commit()?;
            Ok(chat)
        })
    }

    /// Replaces the message text and room. Reply snapshots held by other
    /// chats are left as they were.
    pub fn replace_chat(&self, id: &str, message: &str, room_id: &str) -> Result<Option<ChatRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE chats SET message = ?2, room_id = ?3 WHERE id = ?1",
                params![id, message, room_id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_chat_by_id(conn, id)
        })
    }

    pub fn delete_chat(&self, id: &str) -> Result<bool> {
        self.delete_by_id("chats", id)
    }

    /// Deletes every chat in `room_id`. Returns the number removed.
    pub fn delete_room(&self, room_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM chats WHERE room_id = ?1", [room_id])?))
    }

    fn delete_by_id(&self, table: &'static str, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
            Ok(removed > 0)
        })
    }
}

fn query_all<P, T>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_one<P, T>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    stmt.query_row(params, map).optional()
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    query_one(conn, &sql, [id], user_from_row)
}

fn query_paste_by_id(conn: &Connection, id: &str) -> Result<Option<PasteRow>> {
    let sql = format!("SELECT {PASTE_COLUMNS} FROM pastes WHERE id = ?1");
    query_one(conn, &sql, [id], paste_from_row)
}

fn query_blog_by_id(conn: &Connection, id: &str) -> Result<Option<BlogRow>> {
    let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = ?1");
    query_one(conn, &sql, [id], blog_from_row)
}

fn query_chat_by_id(conn: &Connection, id: &str) -> Result<Option<ChatRow>> {
    let sql = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1");
    query_one(conn, &sql, [id], chat_from_row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        name: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn paste_from_row(row: &Row<'_>) -> rusqlite::Result<PasteRow> {
    let id: String = row.get(0)?;
    let tags: String = row.get(3)?;
    Ok(PasteRow {
        tags: decode_tags(&tags, &id),
        id,
        title: row.get(1)?,
        content: row.get(2)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn blog_from_row(row: &Row<'_>) -> rusqlite::Result<BlogRow> {
    let id: String = row.get(0)?;
    let tags: String = row.get(3)?;
    Ok(BlogRow {
        tags: decode_tags(&tags, &id),
        id,
        title: row.get(1)?,
        content: row.get(2)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        message: row.get(3)?,
        room_id: row.get(4)?,
        reply_to: row.get(5)?,
        reply_to_message: row.get(6)?,
        reply_to_username: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, username: &str, email: &str) -> UserRow {
        UserRow {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            password: "hash".into(),
            name: None,
            role: "user".into(),
            created_at: now_timestamp(),
        }
    }

    fn chat(id: &str, room: &str, message: &str, reply_to: Option<&str>) -> ChatRow {
        ChatRow {
            id: id.into(),
            user_id: "u1".into(),
            username: "alice".into(),
            message: message.into(),
            room_id: room.into(),
            reply_to: reply_to.map(str::to_string),
            reply_to_message: None,
            reply_to_username: None,
            created_at: now_timestamp(),
        }
    }

    fn paste(id: &str) -> PasteRow {
        PasteRow {
            id: id.into(),
            title: "first".into(),
            content: "hello world".into(),
            tags: vec!["rust".into(), "notes".into()],
            user_id: "u1".into(),
            created_at: now_timestamp(),
        }
    }

    #[test]
    fn login_lookup_matches_either_field() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "alice", "alice@x.com")).unwrap();

        for (u, e) in [
            ("alice", "alice"),
            ("alice", "alice@x.com"),
            ("alice@x.com", "alice"),
            ("alice@x.com", "alice@x.com"),
        ] {
            let found = db.find_user_for_login(u, e).unwrap();
            assert_eq!(found.map(|r| r.id), Some("u1".to_string()), "{u}/{e}");
        }
        assert!(db.find_user_for_login("bob", "bob").unwrap().is_none());
    }

    #[test]
    fn blank_identifier_does_not_match_blank_email() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "carol", "")).unwrap();
        db.create_user(&user("u2", "dave", "dave@x.com")).unwrap();

        let found = db.find_user_for_login("dave", "").unwrap();
        assert_eq!(found.map(|r| r.id), Some("u2".to_string()));
        assert!(db.find_user_for_login("no-such-user", "").unwrap().is_none());
        assert!(db.find_user_for_login("", "").unwrap().is_none());
    }

    #[test]
    fn paste_replace_and_delete() {
        let db = Database::open_in_memory().unwrap();
        db.insert_paste(&paste("p1")).unwrap();

        let stored = db.list_pastes().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].tags, vec!["rust", "notes"]);

        let updated = db
            .replace_paste("p1", "renamed", "new body", &["x".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.user_id, "u1");

        assert!(db.replace_paste("missing", "t", "c", &[]).unwrap().is_none());
        assert_eq!(db.list_pastes().unwrap().len(), 1);

        assert!(db.delete_paste("p1").unwrap());
        assert!(!db.delete_paste("p1").unwrap());
        assert!(db.list_pastes().unwrap().is_empty());
    }

    #[test]
    fn blog_replace_stamps_updated_at() {
        let db = Database::open_in_memory().unwrap();
        db.insert_blog(&BlogRow {
            id: "b1".into(),
            title: "a post".into(),
            content: "body".into(),
            tags: vec![],
            user_id: "u1".into(),
            created_at: now_timestamp(),
            updated_at: None,
        })
        .unwrap();

        assert!(db.get_blog("b1").unwrap().unwrap().updated_at.is_none());
        let updated = db.replace_blog("b1", "edited", "body", &[]).unwrap().unwrap();
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn reply_snapshots_parent_and_survives_its_deletion() {
        let db = Database::open_in_memory().unwrap();
        db.insert_chat(chat("c1", "general", "original", None)).unwrap();

        let reply = db.insert_chat(chat("c2", "general", "answer", Some("c1"))).unwrap();
        assert_eq!(reply.reply_to_message.as_deref(), Some("original"));
        assert_eq!(reply.reply_to_username.as_deref(), Some("alice"));

        // Editing the parent does not touch the snapshot.
        db.replace_chat("c1", "edited", "general").unwrap();
        db.delete_chat("c1").unwrap();
        let kept = db.get_chat("c2").unwrap().unwrap();
        assert_eq!(kept.reply_to_message.as_deref(), Some("original"));
    }

    #[test]
    fn reply_to_unknown_parent_leaves_snapshot_empty() {
        let db = Database::open_in_memory().unwrap();
        let reply = db.insert_chat(chat("c1", "general", "hi", Some("nope"))).unwrap();
        assert_eq!(reply.reply_to.as_deref(), Some("nope"));
        assert!(reply.reply_to_message.is_none());
        assert!(reply.reply_to_username.is_none());
    }

    #[test]
    fn delete_room_only_touches_that_room() {
        let db = Database::open_in_memory().unwrap();
        db.insert_chat(chat("c1", "general", "a", None)).unwrap();
        db.insert_chat(chat("c2", "general", "b", None)).unwrap();
        db.insert_chat(chat("c3", "rust", "c", None)).unwrap();

        assert_eq!(db.delete_room("general").unwrap(), 2);
        let left = db.list_chats().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].room_id, "rust");
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user("u1", "alice", "alice@x.com")).unwrap();

        let row = db
            .update_user_profile("u1", Some("Alice A."), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(row.name.as_deref(), Some("Alice A."));
        assert_eq!(row.email, "alice@x.com");

        assert!(db.update_user_profile("u9", None, None, None).unwrap().is_none());
        assert!(db.set_role("u1", "admin").unwrap().is_some());
        assert!(!db.set_password_hash("u9", "h").unwrap());
    }
}
