use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;
use warbler_types::models::MESSAGE_MAX_LEN;

use super::{MESSAGE_SELECT, message_from_row, now_timestamp};
use crate::models::{MessageRow, TimelineRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Messages --

    pub fn create_message(&self, owner_id: &str, text: &str) -> Result<MessageRow> {
        validate_text(text)?;
        let id = Uuid::new_v4().to_string();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, text, timestamp, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![id, text, now_timestamp(), owner_id],
            )?;
            debug!("User {} posted message {}", owner_id, id);

            query_message(conn, &id)?.ok_or(DbError::NotFound("message"))
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Delete a message on behalf of `requester_id`, who must own it.
    pub fn delete_message(&self, id: &str, requester_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let owner: Option<String> = tx
                .query_row("SELECT user_id FROM messages WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;

            match owner {
                None => return Err(DbError::NotFound("message")),
                Some(owner) if owner != requester_id => return Err(DbError::NotOwner),
                Some(_) => {}
            }

            tx.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            tx.commit()?;

            info!("Message {} deleted by {}", id, requester_id);
            Ok(())
        })
    }

    /// Newest first.
    pub fn messages_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.rowid DESC
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(params![user_id, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Newest-first messages written by `viewer_id` or anyone they follow,
    /// each flagged with whether the viewer likes it.
    pub fn home_timeline(&self, viewer_id: &str, limit: u32) -> Result<Vec<TimelineRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url,
                        EXISTS (SELECT 1 FROM likes l WHERE l.message_id = m.id AND l.user_id = ?1)
                 FROM messages m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.timestamp DESC, m.rowid DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![viewer_id, limit], |row| {
                    Ok(TimelineRow {
                        message: message_from_row(row)?,
                        liked: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(
            &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
            [id],
            message_from_row,
        )
        .optional()?;

    Ok(row)
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(DbError::Validation("message text is empty".into()));
    }
    let len = text.chars().count();
    if len > MESSAGE_MAX_LEN {
        return Err(DbError::Validation(format!(
            "message text is {len} characters, limit is {MESSAGE_MAX_LEN}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{count, insert_user};

    #[test]
    fn message_belongs_to_its_author() {
        let db = Database::open_in_memory().unwrap();
        let user = insert_user(&db, "testuser1");

        let msg = db
            .create_message(&user.id, "This is a test message for testuser1")
            .unwrap();

        assert_eq!(msg.user_id, user.id);
        assert_eq!(msg.author_username, "testuser1");
        assert!(!msg.timestamp.is_empty());
        assert_eq!(db.user_stats(&user.id).unwrap().messages, 1);
    }

    #[test]
    fn text_must_be_present_and_bounded() {
        let db = Database::open_in_memory().unwrap();
        let user = insert_user(&db, "testuser1");

        assert!(matches!(db.create_message(&user.id, ""), Err(DbError::Validation(_))));
        assert!(matches!(db.create_message(&user.id, "  \n"), Err(DbError::Validation(_))));

        let too_long = "x".repeat(MESSAGE_MAX_LEN + 1);
        assert!(matches!(
            db.create_message(&user.id, &too_long),
            Err(DbError::Validation(_))
        ));

        // Bound counts characters, not bytes.
        let multibyte = "é".repeat(MESSAGE_MAX_LEN);
        assert!(db.create_message(&user.id, &multibyte).is_ok());
        assert_eq!(count(&db, "messages"), 1);
    }

    #[test]
    fn unknown_owner_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.create_message("missing", "hello"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn owner_can_delete_message() {
        let db = Database::open_in_memory().unwrap();
        let user = insert_user(&db, "testuser1");
        let msg = db.create_message(&user.id, "bye").unwrap();

        db.delete_message(&msg.id, &user.id).unwrap();

        assert!(db.get_message(&msg.id).unwrap().is_none());
        assert!(db.messages_for_user(&user.id, 100).unwrap().is_empty());
    }

    #[test]
    fn other_user_cannot_delete_message() {
        let db = Database::open_in_memory().unwrap();
        let owner = insert_user(&db, "testuser1");
        let other = insert_user(&db, "testuser2");
        let msg = db.create_message(&owner.id, "mine").unwrap();

        assert!(matches!(
            db.delete_message(&msg.id, &other.id),
            Err(DbError::NotOwner)
        ));
        assert!(matches!(
            db.delete_message("missing", &owner.id),
            Err(DbError::NotFound("message"))
        ));
        assert!(db.get_message(&msg.id).unwrap().is_some());
    }

    #[test]
    fn deleting_user_removes_their_messages() {
        let db = Database::open_in_memory().unwrap();
        let alice = insert_user(&db, "alice");
        db.create_message(&alice.id, "hi").unwrap();

        db.delete_user(&alice.id).unwrap();

        assert!(db.messages_for_user(&alice.id, 100).unwrap().is_empty());
        assert_eq!(count(&db, "messages"), 0);
    }

    #[test]
    fn user_messages_are_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let user = insert_user(&db, "testuser1");
        for text in ["first", "second", "third"] {
            db.create_message(&user.id, text).unwrap();
        }

        let texts: Vec<String> = db
            .messages_for_user(&user.id, 2)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["third", "second"]);
    }

    #[test]
    fn home_timeline_shows_own_and_followed_messages() {
        let db = Database::open_in_memory().unwrap();
        let me = insert_user(&db, "testuser");
        let friend = insert_user(&db, "otheruser");
        let stranger = insert_user(&db, "stranger");

        db.follow(&me.id, &friend.id).unwrap();
        let own = db.create_message(&me.id, "mine").unwrap();
        let theirs = db
            .create_message(&friend.id, "This is a test message for otheruser")
            .unwrap();
        db.create_message(&stranger.id, "not for you").unwrap();
        db.like(&me.id, &theirs.id).unwrap();

        let timeline = db.home_timeline(&me.id, 100).unwrap();
        let ids: Vec<&str> = timeline.iter().map(|t| t.message.id.as_str()).collect();
        assert_eq!(ids, vec![theirs.id.as_str(), own.id.as_str()]);
        assert!(timeline[0].liked);
        assert!(!timeline[1].liked);
    }
}
