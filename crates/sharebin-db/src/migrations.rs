use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial collections)");
        // Collections are document-shaped: no foreign keys, so a chat may
        // outlive the message it replied to.
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL,
                email       TEXT NOT NULL DEFAULT '',
                password    TEXT NOT NULL,
                name        TEXT,
                role        TEXT NOT NULL DEFAULT 'user',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_users_username ON users(username);
            CREATE INDEX idx_users_email ON users(email);

            CREATE TABLE pastes (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL DEFAULT '',
                content     TEXT NOT NULL DEFAULT '',
                tags        TEXT NOT NULL DEFAULT '[]',
                user_id     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE blogs (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL DEFAULT '',
                content     TEXT NOT NULL DEFAULT '',
                tags        TEXT NOT NULL DEFAULT '[]',
                user_id     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT
            );

            CREATE TABLE chats (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL,
                username            TEXT NOT NULL,
                message             TEXT NOT NULL DEFAULT '',
                room_id             TEXT NOT NULL DEFAULT 'general',
                reply_to            TEXT,
                reply_to_message    TEXT,
                reply_to_username   TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_chats_room ON chats(room_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
