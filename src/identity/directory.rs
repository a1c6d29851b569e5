//! User registration and lookup.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::storage;
use super::types::{User, UserId};
use crate::config::ContentLimits;
use crate::db::Database;
use crate::error::{Result, SocialError};
use crate::validation::Validator;

/// Resolves user identifiers to records and registers new users.
pub struct UserDirectory {
    db: Arc<Database>,
    limits: ContentLimits,
}

impl UserDirectory {
    /// Creates a directory over the given database.
    #[must_use]
    pub const fn new(db: Arc<Database>, limits: ContentLimits) -> Self {
        Self { db, limits }
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::Validation`] listing every invalid field, or
    /// [`SocialError::UsernameTaken`] if the username is registered.
    #[instrument(skip(self, display_name, bio))]
    pub fn create_user(
        &self,
        username: &str,
        display_name: Option<&str>,
        bio: Option<&str>,
    ) -> Result<User> {
        self.validate_profile(Some(username), display_name, bio)?;

        let now = chrono::Utc::now().timestamp();
        let user = self
            .db
            .transaction(|tx| storage::insert_user(tx, username, display_name, bio, now))?;

        info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    /// Looks up a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.db.read(|conn| storage::get_user(conn, id))
    }

    /// Looks up a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        debug!(username, "looking up user");
        self.db.read(|conn| storage::find_by_username(conn, username))
    }

    /// Replaces a user's display name and bio.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::Validation`] for invalid fields or
    /// [`SocialError::UserNotFound`] if the user doesn't exist.
    #[instrument(skip(self, display_name, bio))]
    pub fn update_profile(
        &self,
        id: UserId,
        display_name: Option<&str>,
        bio: Option<&str>,
    ) -> Result<User> {
        self.validate_profile(None, display_name, bio)?;

        self.db.transaction(|tx| {
            if !storage::update_profile(tx, id, display_name, bio)? {
                return Err(SocialError::UserNotFound(id));
            }
            storage::get_user(tx, id)?.ok_or(SocialError::UserNotFound(id))
        })
    }

    fn validate_profile(
        &self,
        username: Option<&str>,
        display_name: Option<&str>,
        bio: Option<&str>,
    ) -> Result<()> {
        let mut validator = Validator::new();
        if let Some(username) = username {
            validator
                .required("username", username, self.limits.max_username_len)
                .identifier("username", username);
        }
        validator
            .optional(
                "display name",
                display_name,
                self.limits.max_display_name_len,
            )
            .optional("bio", bio, self.limits.max_bio_len)
            .finish()
    }
}
