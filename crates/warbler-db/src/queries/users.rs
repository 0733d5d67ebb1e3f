use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;
use warbler_crypto::password::{hash_password, reject_unknown_user, verify_password};
use warbler_types::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL};

use super::{USER_COLUMNS, non_blank, now_timestamp, user_from_row};
use crate::models::{ProfileUpdate, UserRow, UserStatsRow};
use crate::{Database, DbError, Result};

impl Database {
    // -- Signup / login --

    /// Create an account. The password is hashed before it reaches the store;
    /// duplicate emails and usernames are rejected by the UNIQUE constraints.
    pub fn signup(
        &self,
        email: &str,
        username: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<UserRow> {
        let email = required("email", email)?;
        let username = required("username", username)?;
        if password.is_empty() {
            return Err(DbError::MissingField("password"));
        }
        let image_url = non_blank(image_url).unwrap_or(DEFAULT_IMAGE_URL);

        let password_hash =
            hash_password(password).map_err(|e| DbError::Credential(e.to_string()))?;
        let id = Uuid::new_v4().to_string();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, username, image_url, header_image_url, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    email,
                    username,
                    image_url,
                    DEFAULT_HEADER_IMAGE_URL,
                    password_hash,
                    now_timestamp()
                ],
            )?;
            info!("User {} signed up as {}", id, username);

            query_user_by_id(conn, &id)?.ok_or(DbError::NotFound("user"))
        })
    }

    /// Returns the user when `password` verifies, `None` for an unknown
    /// username or a wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserRow>> {
        let Some(user) = self.get_user_by_username(username)? else {
            debug!("Login attempt for unknown user {}", username);
            reject_unknown_user(password);
            return Ok(None);
        };

        if verify_password(password, &user.password) {
            Ok(Some(user))
        } else {
            debug!("Wrong password for {}", username);
            Ok(None)
        }
    }

    // -- Lookup --

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"),
                    [username],
                    user_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// All users, or those whose username contains `query` (ASCII case-insensitive).
    pub fn search_users(&self, query: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            // An empty needle yields "%%", which matches every username.
            let pattern = format!("%{}%", escape_like(non_blank(query).unwrap_or_default()));

            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users u
                 WHERE u.username LIKE ?1 ESCAPE '\\'
                 ORDER BY u.username"
            ))?;
            let rows = stmt
                .query_map([pattern], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn user_stats(&self, id: &str) -> Result<UserStatsRow> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |row| {
                    Ok(UserStatsRow {
                        messages: row.get::<_, i64>(0)? as u64,
                        following: row.get::<_, i64>(1)? as u64,
                        followers: row.get::<_, i64>(2)? as u64,
                        likes: row.get::<_, i64>(3)? as u64,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    // -- Profile --

    pub fn update_profile(&self, id: &str, update: &ProfileUpdate<'_>) -> Result<UserRow> {
        self.with_conn(|conn| write_profile(conn, id, update))
    }

    /// Apply `update` only when `password` matches the account's current
    /// password. The check and the write share one transaction. A wrong
    /// password gives `Ok(None)` and leaves the row untouched.
    pub fn update_profile_confirmed(
        &self,
        id: &str,
        password: &str,
        update: &ProfileUpdate<'_>,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let stored: String = tx
                .query_row("SELECT password FROM users WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?
                .ok_or(DbError::NotFound("user"))?;

            if !verify_password(password, &stored) {
                debug!("Wrong password for profile update of {}", id);
                return Ok(None);
            }

            let row = write_profile(&tx, id, update)?;
            tx.commit()?;
            Ok(Some(row))
        })
    }

    /// Delete an account. Messages, follows and likes go with it via
    /// ON DELETE CASCADE.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(DbError::NotFound("user"));
            }
            info!("User {} deleted", id);
            Ok(())
        })
    }
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
            [id],
            user_from_row,
        )
        .optional()?;

    Ok(row)
}

fn write_profile(conn: &Connection, id: &str, update: &ProfileUpdate<'_>) -> Result<UserRow> {
    let email = required("email", update.email)?;
    let username = required("username", update.username)?;

    let changed = conn.execute(
        "UPDATE users
         SET email = ?2, username = ?3, image_url = ?4, header_image_url = ?5,
             bio = ?6, location = ?7
         WHERE id = ?1",
        params![
            id,
            email,
            username,
            non_blank(update.image_url).unwrap_or(DEFAULT_IMAGE_URL),
            non_blank(update.header_image_url).unwrap_or(DEFAULT_HEADER_IMAGE_URL),
            non_blank(update.bio),
            non_blank(update.location),
        ],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound("user"));
    }
    info!("User {} updated profile", id);

    query_user_by_id(conn, id)?.ok_or(DbError::NotFound("user"))
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    non_blank(Some(value)).ok_or(DbError::MissingField(field))
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
