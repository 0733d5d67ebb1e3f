//! Row -> API model conversion.
//!
//! Ids and timestamps are stored as text. A value that fails to parse is
//! logged and replaced with its default instead of failing the whole page.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use warbler_db::models::{MessageRow, TimelineRow, UserRow, UserStatsRow};
use warbler_types::api::TimelineEntry;
use warbler_types::models::{Message, User, UserStats};

pub fn user(row: UserRow) -> User {
    User {
        id: parse_id(&row.id, "user"),
        created_at: parse_timestamp(&row.created_at, &row.id),
        email: row.email,
        username: row.username,
        image_url: row.image_url,
        header_image_url: row.header_image_url,
        bio: row.bio,
        location: row.location,
    }
}

pub fn users(rows: Vec<UserRow>) -> Vec<User> {
    rows.into_iter().map(user).collect()
}

pub fn message(row: MessageRow) -> Message {
    Message {
        id: parse_id(&row.id, "message"),
        timestamp: parse_timestamp(&row.timestamp, &row.id),
        user_id: parse_id(&row.user_id, "author"),
        text: row.text,
        username: row.author_username,
        user_image_url: row.author_image_url,
    }
}

pub fn messages(rows: Vec<MessageRow>) -> Vec<Message> {
    rows.into_iter().map(message).collect()
}

pub fn timeline(rows: Vec<TimelineRow>) -> Vec<TimelineEntry> {
    rows.into_iter()
        .map(|row| TimelineEntry {
            message: message(row.message),
            liked: row.liked,
        })
        .collect()
}

pub fn stats(row: UserStatsRow) -> UserStats {
    UserStats {
        messages: row.messages,
        following: row.following,
        followers: row.followers,
        likes: row.likes,
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now'):
            // "YYYY-MM-DD HH:MM:SS" without timezone. Parse as naive UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on '{}': {}", raw, owner, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_timestamp_layouts() {
        let rfc = parse_timestamp("2024-03-01T12:00:00.250Z", "m1");
        assert_eq!(rfc.timestamp_millis() % 1000, 250);

        let naive = parse_timestamp("2024-03-01 12:00:00", "m1");
        assert_eq!(naive, "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        assert_eq!(parse_id("not-a-uuid", "user"), Uuid::nil());
        assert_eq!(parse_timestamp("yesterday", "m1"), DateTime::<Utc>::default());
    }
}
