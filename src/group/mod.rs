//! Groups, memberships and posts.
//!
//! # Architecture
//!
//! ```text
//! GroupMembershipWorkflow (workflow: validate → mutate → notify)
//!     ├── storage (user_groups, group_admins, group_memberships, posts tables)
//!     └── Notifier (GROUP_JOIN_REQUEST, GROUP_JOIN_RESPONSE, ...)
//! ```
//!
//! Each group keeps a non-empty admin set. Joining a closed group produces a
//! pending membership that an admin approves or rejects; joining an open
//! group is approved immediately.

mod manager;
pub(crate) mod storage;
mod types;

pub use manager::GroupMembershipWorkflow;
pub use types::{
    Group, GroupConfig, GroupId, GroupMembership, MembershipId, MembershipRole, MembershipStatus,
    Post, PostId,
};
