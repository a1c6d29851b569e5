//! Error types for social graph operations.
//!
//! Every workflow operation returns [`SocialError`] for both expected
//! conditions (validation, missing records, permission and conflict cases)
//! and unexpected ones (database failures). Callers use [`SocialError::kind`]
//! to map an error onto a response class and [`SocialError::messages`] to
//! obtain the human-readable list shown to the user.

use thiserror::Error;

use crate::ids::{GroupId, PostId, RequestId, UserId};

/// Broad classification of a [`SocialError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input was malformed; the caller can correct it and retry.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// The actor lacks permission for the operation.
    Forbidden,
    /// The operation conflicts with existing state.
    Conflict,
    /// Unexpected failure; nothing was changed.
    Fatal,
}

/// Error type for social graph operations.
#[derive(Error, Debug)]
pub enum SocialError {
    /// One or more input fields failed validation.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    /// Friend request not found.
    #[error("Friend request not found: {0}")]
    RequestNotFound(RequestId),

    /// No membership record for the user and group.
    #[error("Membership not found for user {user} in group {group}")]
    MembershipNotFound {
        /// The user.
        user: UserId,
        /// The group.
        group: GroupId,
    },

    /// Post not found.
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    /// The two users are not friends.
    #[error("No friendship between {0} and {1}")]
    FriendshipNotFound(UserId, UserId),

    /// Actor is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A user tried to befriend themselves.
    #[error("Cannot send a friend request to yourself")]
    SelfReference,

    /// The users are already friends.
    #[error("Users {0} and {1} are already friends")]
    AlreadyFriends(UserId, UserId),

    /// A pending request already exists for the ordered pair.
    #[error("A pending friend request from {0} to {1} already exists")]
    DuplicatePending(UserId, UserId),

    /// The user already has a membership record for the group.
    #[error("User {user} is already a member of, or has a pending request for, group {group}")]
    AlreadyMemberOrPending {
        /// The user.
        user: UserId,
        /// The group.
        group: GroupId,
    },

    /// The sole admin cannot leave or be removed.
    #[error("User {user} is the last admin of group {group}")]
    LastAdminProtection {
        /// The admin.
        user: UserId,
        /// The group.
        group: GroupId,
    },

    /// The record is not in a state that allows the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Username already registered.
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Group name already in use.
    #[error("Group name already taken: {0}")]
    GroupNameTaken(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored data could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for social graph operations.
pub type Result<T> = std::result::Result<T, SocialError>;

impl SocialError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UserNotFound(_)
            | Self::GroupNotFound(_)
            | Self::RequestNotFound(_)
            | Self::MembershipNotFound { .. }
            | Self::PostNotFound(_)
            | Self::FriendshipNotFound(..) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::SelfReference
            | Self::AlreadyFriends(..)
            | Self::DuplicatePending(..)
            | Self::AlreadyMemberOrPending { .. }
            | Self::LastAdminProtection { .. }
            | Self::InvalidState(_)
            | Self::UsernameTaken(_)
            | Self::GroupNameTaken(_) => ErrorKind::Conflict,
            Self::Database(_) | Self::Storage(_) | Self::InvalidData(_) | Self::Config(_) => {
                ErrorKind::Fatal
            }
        }
    }

    /// Returns `true` for unexpected failures.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Fatal)
    }

    /// Returns the caller-facing messages for this error.
    ///
    /// Validation errors yield one message per failed field. Fatal errors
    /// yield a single opaque message; the details are only logged.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            _ if self.is_fatal() => vec!["Internal error".to_string()],
            _ => vec![self.to_string()],
        }
    }
}

/// Returns `true` if the error is a `SQLite` uniqueness or constraint failure.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
