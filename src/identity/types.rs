//! User identity types.

use serde::{Deserialize, Serialize};

pub use crate::ids::UserId;

/// A registered user.
///
/// Profile fields are carried for display only; workflows care about `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Optional free-form bio.
    pub bio: Option<String>,
    /// When the user registered (Unix timestamp).
    pub created_at: i64,
}

impl User {
    /// Name to show in messages: display name if set, otherwise username.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
