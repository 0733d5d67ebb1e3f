use rusqlite::{Connection, params};
use tracing::debug;

use super::{USER_COLUMNS, now_timestamp, user_from_row};
use crate::models::{FollowRow, UserRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Follows --

    /// Record that `follower_id` follows `leader_id`. Following the same user
    /// twice fails with `UniquenessViolation("follows")`.
    pub fn follow(&self, follower_id: &str, leader_id: &str) -> Result<FollowRow> {
        if follower_id == leader_id {
            return Err(DbError::Validation("users cannot follow themselves".into()));
        }

        self.with_conn(|conn| {
            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO follows (follower_id, followed_id, created_at) VALUES (?1, ?2, ?3)",
                params![follower_id, leader_id, created_at],
            )?;
            debug!("{} now follows {}", follower_id, leader_id);

            Ok(FollowRow {
                follower_id: follower_id.to_string(),
                followed_id: leader_id.to_string(),
                created_at,
            })
        })
    }

    /// Returns whether a follow was removed.
    pub fn unfollow(&self, follower_id: &str, leader_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                params![follower_id, leader_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// True iff `user_id` follows `other_id`.
    pub fn is_following(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.with_conn(|conn| follow_exists(conn, user_id, other_id))
    }

    /// True iff `other_id` follows `user_id`.
    pub fn is_followed_by(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.with_conn(|conn| follow_exists(conn, other_id, user_id))
    }

    /// Users that `user_id` follows, by username.
    pub fn following(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS}
                 FROM follows f
                 JOIN users u ON u.id = f.followed_id
                 WHERE f.follower_id = ?1
                 ORDER BY u.username"
            ))?;

            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Users following `user_id`, by username.
    pub fn followers(&self, user_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS}
                 FROM follows f
                 JOIN users u ON u.id = f.follower_id
                 WHERE f.followed_id = ?1
                 ORDER BY u.username"
            ))?;

            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn follow_exists(conn: &Connection, follower_id: &str, followed_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
        params![follower_id, followed_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{count, insert_user};

    #[test]
    fn new_user_has_no_followers() {
        let db = Database::open_in_memory().unwrap();
        let user = insert_user(&db, "testuser");

        assert!(db.followers(&user.id).unwrap().is_empty());
        assert!(db.following(&user.id).unwrap().is_empty());
    }

    #[test]
    fn is_following_detects_follow() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");
        let u2 = insert_user(&db, "testuser2");

        db.follow(&u1.id, &u2.id).unwrap();

        assert_eq!(db.followers(&u2.id).unwrap().len(), 1);
        assert_eq!(db.following(&u1.id).unwrap().len(), 1);
        assert!(db.is_following(&u1.id, &u2.id).unwrap());
        assert!(!db.is_following(&u2.id, &u1.id).unwrap());
    }

    #[test]
    fn is_following_false_without_follow() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");
        let u2 = insert_user(&db, "testuser2");

        assert!(!db.is_following(&u1.id, &u2.id).unwrap());
        assert!(!db.is_followed_by(&u2.id, &u1.id).unwrap());
    }

    #[test]
    fn following_and_followed_by_agree() {
        let db = Database::open_in_memory().unwrap();
        let users: Vec<UserRow> = ["a", "b", "c"].iter().map(|n| insert_user(&db, n)).collect();
        db.follow(&users[0].id, &users[1].id).unwrap();
        db.follow(&users[1].id, &users[2].id).unwrap();
        db.follow(&users[2].id, &users[1].id).unwrap();

        for u1 in &users {
            for u2 in &users {
                assert_eq!(
                    db.is_following(&u1.id, &u2.id).unwrap(),
                    db.is_followed_by(&u2.id, &u1.id).unwrap(),
                    "{} -> {}",
                    u1.username,
                    u2.username
                );
            }
        }
    }

    #[test]
    fn duplicate_follow_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");
        let u2 = insert_user(&db, "testuser2");

        db.follow(&u1.id, &u2.id).unwrap();
        let err = db.follow(&u1.id, &u2.id).unwrap_err();

        assert!(matches!(err, DbError::UniquenessViolation(ref t) if t == "follows"));
        assert_eq!(count(&db, "follows"), 1);
    }

    #[test]
    fn cannot_follow_self() {
        let db = Database::open_in_memory().unwrap();
        let u1 = insert_user(&db, "testuser1");

        assert!(matches!(db.follow(&u1.id, &u1.id), Err(DbError::Validation(_))));
        assert_eq!(count(&db, "follows"), 0);
    }

    #[test]
    fn follow_then_unfollow() {
        let db = Database::open_in_memory().unwrap();
        let alice = insert_user(&db, "alice");
        let bob = insert_user(&db, "bob");

        db.follow(&alice.id, &bob.id).unwrap();
        assert!(db.unfollow(&alice.id, &bob.id).unwrap());
        assert!(!db.unfollow(&alice.id, &bob.id).unwrap());

        assert!(!db.is_following(&alice.id, &bob.id).unwrap());
    }

    #[test]
    fn deleting_user_removes_follows_both_ways() {
        let db = Database::open_in_memory().unwrap();
        let alice = insert_user(&db, "alice");
        let bob = insert_user(&db, "bob");
        let carol = insert_user(&db, "carol");
        db.follow(&alice.id, &bob.id).unwrap();
        db.follow(&bob.id, &alice.id).unwrap();
        db.follow(&bob.id, &carol.id).unwrap();

        db.delete_user(&alice.id).unwrap();

        assert_eq!(count(&db, "follows"), 1);
        assert!(db.followers(&bob.id).unwrap().is_empty());
        assert_eq!(db.following(&bob.id).unwrap()[0].id, carol.id);
    }
}
