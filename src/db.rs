//! `SQLite` database shared by all workflows.
//!
//! One connection guarded by a mutex. Writes go through
//! [`Database::transaction`], which holds the lock for the whole closure and
//! runs it inside a `BEGIN IMMEDIATE` transaction, so every check-then-act
//! sequence in a workflow operation is serialized and rolled back on error.

// SQLite operations need to hold the lock for the duration of the operation.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::error;

use crate::error::{Result, SocialError};

/// Thread-safe handle to the social graph database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (or creates) the database at the given path.
    ///
    /// Creates the tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Creates an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SocialError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                display_name TEXT,
                bio TEXT,
                created_at INTEGER NOT NULL
            );

            -- One directed edge per direction of a confirmed friendship
            CREATE TABLE IF NOT EXISTS friendships (
                owner_id INTEGER NOT NULL REFERENCES users(id),
                friend_id INTEGER NOT NULL REFERENCES users(id),
                since INTEGER NOT NULL,
                PRIMARY KEY (owner_id, friend_id),
                CHECK (owner_id <> friend_id)
            );
            CREATE INDEX IF NOT EXISTS idx_friendships_friend ON friendships(friend_id);

            CREATE TABLE IF NOT EXISTS friend_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                requester_id INTEGER NOT NULL REFERENCES users(id),
                receiver_id INTEGER NOT NULL REFERENCES users(id),
                status TEXT NOT NULL DEFAULT 'pending',
                created_at INTEGER NOT NULL,
                responded_at INTEGER,
                CHECK (requester_id <> receiver_id)
            );
            -- At most one pending request per ordered pair
            CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_requests_pending
                ON friend_requests(requester_id, receiver_id)
                WHERE status = 'pending';
            CREATE INDEX IF NOT EXISTS idx_friend_requests_receiver
                ON friend_requests(receiver_id, status);

            CREATE TABLE IF NOT EXISTS user_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                is_open INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Admin set, kept in sync with membership roles by the workflow
            CREATE TABLE IF NOT EXISTS group_admins (
                group_id INTEGER NOT NULL REFERENCES user_groups(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (group_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS group_memberships (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                group_id INTEGER NOT NULL REFERENCES user_groups(id),
                role TEXT NOT NULL DEFAULT 'member',
                status TEXT NOT NULL DEFAULT 'pending',
                joined_at INTEGER NOT NULL,
                responded_at INTEGER,
                UNIQUE (user_id, group_id)
            );
            CREATE INDEX IF NOT EXISTS idx_memberships_group
                ON group_memberships(group_id, status);

            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL REFERENCES user_groups(id),
                author_id INTEGER NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id);
            ",
        )?;

        Ok(())
    }

    /// Runs `f` inside a single immediate transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; any error rolls
    /// back every change made by `f`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or a database error if the
    /// transaction cannot be started or committed.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        log_fatal(Self::run_immediate(&mut conn, f))
    }

    fn run_immediate<T, F>(conn: &mut Connection, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Runs a read-only closure against the connection.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f` or a lock failure.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        log_fatal(f(&conn))
    }
}

/// Logs fatal errors before they leave the storage layer.
fn log_fatal<T>(result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_fatal() {
            error!(error = %e, "database operation failed");
        }
    }
    result
}
