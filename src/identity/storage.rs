//! Row-level access to the `users` table.
//!
//! Lookups return `Option`; absence is never an error at this layer.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{User, UserId};
use crate::error::{is_constraint_violation, Result, SocialError};

const USER_COLUMNS: &str = "id, username, display_name, bio, created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        bio: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Inserts a new user and returns it.
pub(crate) fn insert_user(
    conn: &Connection,
    username: &str,
    display_name: Option<&str>,
    bio: Option<&str>,
    created_at: i64,
) -> Result<User> {
    conn.execute(
        "INSERT INTO users (username, display_name, bio, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![username, display_name, bio, created_at],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            SocialError::UsernameTaken(username.to_string())
        } else {
            SocialError::Database(e)
        }
    })?;

    Ok(User {
        id: UserId(conn.last_insert_rowid()),
        username: username.to_string(),
        display_name: display_name.map(ToString::to_string),
        bio: bio.map(ToString::to_string),
        created_at,
    })
}

pub(crate) fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub(crate) fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub(crate) fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Fails with [`SocialError::UserNotFound`] unless the user exists.
pub(crate) fn require_user(conn: &Connection, id: UserId) -> Result<()> {
    if user_exists(conn, id)? {
        Ok(())
    } else {
        Err(SocialError::UserNotFound(id))
    }
}

/// Fetches a user that must exist.
pub(crate) fn load_user(conn: &Connection, id: UserId) -> Result<User> {
    get_user(conn, id)?.ok_or(SocialError::UserNotFound(id))
}

pub(crate) fn update_profile(
    conn: &Connection,
    id: UserId,
    display_name: Option<&str>,
    bio: Option<&str>,
) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE users SET display_name = ?1, bio = ?2 WHERE id = ?3",
        params![display_name, bio, id],
    )?;
    Ok(rows > 0)
}
