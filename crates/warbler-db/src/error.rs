use rusqlite::ffi;
use thiserror::Error;

/// Failures surfaced by the entity schema.
///
/// Constraint failures reported by SQLite are classified here so callers see
/// the same variants whether a rule was checked in Rust or by the store.
#[derive(Error, Debug)]
pub enum DbError {
    /// Duplicate email/username, or a duplicate follow/like pair.
    /// Carries the offending column for users, or the table name otherwise.
    #[error("{0} already taken")]
    UniquenessViolation(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The requester does not own the message it tried to delete.
    #[error("message is owned by another user")]
    NotOwner,

    #[error("credential error: {0}")]
    Credential(String),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return DbError::UniquenessViolation(unique_target(msg));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DbError::NotFound("referenced record"),
                ffi::SQLITE_CONSTRAINT_CHECK => return DbError::Validation(msg.clone()),
                _ => {}
            }
        }
        DbError::Sqlite(err)
    }
}

/// "UNIQUE constraint failed: users.email" -> "email"
/// "UNIQUE constraint failed: follows.follower_id, follows.followed_id" -> "follows"
fn unique_target(msg: &str) -> String {
    let columns = msg
        .strip_prefix("UNIQUE constraint failed: ")
        .unwrap_or(msg);

    match columns.split_once('.') {
        Some(("users", column)) => column.to_string(),
        Some((table, _)) => table.to_string(),
        None => columns.to_string(),
    }
}
