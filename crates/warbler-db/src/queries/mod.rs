mod follows;
mod likes;
mod messages;
mod users;

use rusqlite::Row;

use crate::models::{MessageRow, UserRow};

/// Columns read by `user_from_row`, for queries that alias users as `u`.
const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.image_url, u.header_image_url, u.bio, u.location, u.password, u.created_at";

/// Messages joined with their author; append WHERE/ORDER clauses.
const MESSAGE_SELECT: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON u.id = m.user_id";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
        author_image_url: row.get(5)?,
    })
}

/// UTC now in the same layout the schema defaults use, so rows sort as text.
fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Treat `None`, "" and whitespace-only as absent.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
