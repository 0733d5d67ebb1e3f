use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use uuid::Uuid;

use super::{MESSAGE_SELECT, message_from_row, now_timestamp};
use crate::models::{LikeRow, MessageRow};
use crate::{Database, Result};

impl Database {
    // -- Likes --

    /// Liking the same message twice fails with `UniquenessViolation("likes")`.
    pub fn like(&self, user_id: &str, message_id: &str) -> Result<LikeRow> {
        self.with_conn(|conn| insert_like(conn, user_id, message_id))
    }

    /// Returns whether a like was removed.
    pub fn unlike(&self, user_id: &str, message_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user_id, message_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Toggle a like: removes if exists, inserts if not.
    /// Returns true when the like exists afterwards.
    pub fn toggle_like(&self, user_id: &str, message_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND message_id = ?2",
                    params![user_id, message_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = if let Some(existing_id) = existing {
                tx.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                false
            } else {
                insert_like(&tx, user_id, message_id)?;
                true
            };

            tx.commit()?;
            Ok(liked)
        })
    }

    pub fn is_liked(&self, user_id: &str, message_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let liked = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2)",
                params![user_id, message_id],
                |row| row.get(0),
            )?;
            Ok(liked)
        })
    }

    /// Messages `user_id` has liked, most recently liked first.
    pub fn liked_messages(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 JOIN likes l ON l.message_id = m.id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC, l.rowid DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn insert_like(conn: &Connection, user_id: &str, message_id: &str) -> Result<LikeRow> {
    let like = LikeRow {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        message_id: message_id.to_string(),
        created_at: now_timestamp(),
    };

    conn.execute(
        "INSERT INTO likes (id, user_id, message_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![like.id, like.user_id, like.message_id, like.created_at],
    )?;
    debug!("{} liked message {}", user_id, message_id);

    Ok(like)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::queries::test_support::{count, insert_user};

    #[test]
    fn like_shows_in_likers_collection_only() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");
        let u2 = insert_user(&db, "testuser2");
        let msg = db
            .create_message(&u1.id, "This is a test message for testuser1")
            .unwrap();

        db.like(&u2.id, &msg.id).unwrap();

        assert_eq!(db.user_stats(&u1.id).unwrap().messages, 1);
        assert_eq!(db.user_stats(&u2.id).unwrap().messages, 0);

        let u2_likes = db.liked_messages(&u2.id).unwrap();
        assert_eq!(u2_likes.len(), 1);
        assert_eq!(u2_likes[0].id, msg.id);
        assert!(db.liked_messages(&u1.id).unwrap().is_empty());
    }

    #[test]
    fn duplicate_like_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");
        let u2 = insert_user(&db, "testuser2");
        let msg = db.create_message(&u1.id, "hello").unwrap();

        db.like(&u2.id, &msg.id).unwrap();
        let err = db.like(&u2.id, &msg.id).unwrap_err();

        assert!(matches!(err, DbError::UniquenessViolation(ref t) if t == "likes"));
        assert_eq!(count(&db, "likes"), 1);
    }

    #[test]
    fn like_of_missing_message_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");

        assert!(matches!(db.like(&u1.id, "missing"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn toggle_like_flips_state() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");
        let u2 = insert_user(&db, "testuser2");
        let msg = db.create_message(&u1.id, "hello").unwrap();

        assert!(db.toggle_like(&u2.id, &msg.id).unwrap());
        assert!(db.is_liked(&u2.id, &msg.id).unwrap());

        assert!(!db.toggle_like(&u2.id, &msg.id).unwrap());
        assert!(!db.is_liked(&u2.id, &msg.id).unwrap());
        assert!(!db.unlike(&u2.id, &msg.id).unwrap());
    }

    #[test]
    fn deleting_message_removes_it_from_every_likes_collection() {
        let db = Database::open_in_memory().unwrap();
        let author = insert_user(&db, "author");
        let fans: Vec<_> = ["fan1", "fan2"].iter().map(|n| insert_user(&db, n)).collect();
        let msg = db.create_message(&author.id, "popular").unwrap();
        for fan in &fans {
            db.like(&fan.id, &msg.id).unwrap();
        }

        db.delete_message(&msg.id, &author.id).unwrap();

        for fan in &fans {
            assert!(db.liked_messages(&fan.id).unwrap().is_empty());
        }
        assert_eq!(count(&db, "likes"), 0);
    }

    #[test]
    fn deleting_user_removes_their_likes() {
        let db = Database::open_in_memory().unwrap();
        let author = insert_user(&db, "author");
        let fan = insert_user(&db, "fan");
        let msg = db.create_message(&author.id, "hello").unwrap();
        db.like(&fan.id, &msg.id).unwrap();

        db.delete_user(&fan.id).unwrap();

        assert_eq!(count(&db, "likes"), 0);
        assert!(db.get_message(&msg.id).unwrap().is_some());
    }
}
