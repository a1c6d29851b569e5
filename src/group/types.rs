//! Core types for groups and memberships.
//!
//! A [`Group`] carries its admin set explicitly. The workflow keeps the set
//! in step with membership roles on every mutation: an admin always holds an
//! approved membership with [`MembershipRole::Admin`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use crate::ids::{GroupId, MembershipId, PostId};
use crate::ids::UserId;

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Regular member.
    #[default]
    Member,
    /// Group administrator.
    Admin,
}

impl MembershipRole {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Membership status in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Join request awaiting an admin decision.
    Pending,
    /// Full member.
    Approved,
    /// Join request turned down.
    Rejected,
}

impl MembershipStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A group of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// Unique group name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether join requests are approved automatically.
    pub is_open: bool,
    /// Users allowed to administer the group. Never empty.
    pub admins: BTreeSet<UserId>,
    /// When the group was created (Unix timestamp).
    pub created_at: i64,
    /// When the group was last updated (Unix timestamp).
    pub updated_at: i64,
}

impl Group {
    /// Returns whether `user` administers this group.
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }
}

/// A user's relationship with a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    /// Membership identifier.
    pub id: MembershipId,
    /// The member.
    pub user_id: UserId,
    /// The group.
    pub group_id: GroupId,
    /// Role within the group.
    pub role: MembershipRole,
    /// Current status.
    pub status: MembershipStatus,
    /// When the membership was requested (Unix timestamp).
    pub joined_at: i64,
    /// When the request was approved or rejected (Unix timestamp).
    pub responded_at: Option<i64>,
}

/// A message posted to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier.
    pub id: PostId,
    /// Group the post belongs to.
    pub group_id: GroupId,
    /// Author.
    pub author_id: UserId,
    /// Post body.
    pub content: String,
    /// When the post was created (Unix timestamp).
    pub created_at: i64,
}

/// Configuration for creating or updating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Group name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether join requests are approved automatically.
    pub is_open: bool,
}

impl GroupConfig {
    /// Creates a configuration for a closed group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_open: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Makes the group open or closed.
    #[must_use]
    pub const fn open(mut self, is_open: bool) -> Self {
        self.is_open = is_open;
        self
    }
}
