use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                TEXT PRIMARY KEY,
                email             TEXT NOT NULL UNIQUE,
                username          TEXT NOT NULL UNIQUE,
                image_url         TEXT NOT NULL DEFAULT '/static/images/default-pic.png',
                header_image_url  TEXT NOT NULL DEFAULT '/static/images/warbler-hero.jpg',
                bio               TEXT,
                location          TEXT,
                password          TEXT NOT NULL,
                created_at        TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE messages (
                id          TEXT PRIMARY KEY,
                text        TEXT NOT NULL CHECK (length(text) BETWEEN 1 AND 140),
                timestamp   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_messages_user
                ON messages(user_id, timestamp);

            CREATE TABLE follows (
                follower_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followed_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (follower_id, followed_id),
                CHECK (follower_id <> followed_id)
            );

            CREATE INDEX idx_follows_followed
                ON follows(followed_id);

            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message_id  TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE (user_id, message_id)
            );

            CREATE INDEX idx_likes_message
                ON likes(message_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
