//! Social Core Library
//!
//! Core functionality for a social graph backend: users, friend requests,
//! friendships with mutual-friend suggestions, and groups with an
//! admin-approved membership workflow.
//!
//! [`SocialCore`] is the entry point. It owns the `SQLite` database and
//! hands out the three workflows:
//!
//! - [`UserDirectory`]: registration and lookup
//! - [`RelationshipGraph`]: friend requests and friendships
//! - [`GroupMembershipWorkflow`]: groups, memberships and posts
//!
//! State changes are reported through a [`Notifier`](notify::Notifier) after
//! they commit.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod group;
pub mod identity;
pub mod ids;
pub mod notify;
mod validation;

pub use api::SocialCore;
pub use config::{ContentLimits, EngineConfig};
pub use error::{ErrorKind, Result, SocialError};
pub use graph::RelationshipGraph;
pub use group::GroupMembershipWorkflow;
pub use identity::UserDirectory;
pub use ids::{GroupId, MembershipId, PostId, RequestId, UserId};
