//! Notification event types.

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Kind of state transition a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// A friend request was received.
    FriendRequest,
    /// A friend request was rejected.
    FriendRequestRejected,
    /// A friendship was confirmed.
    FriendAdded,
    /// A friendship was removed.
    FriendRemoved,
    /// A user asked to join a closed group.
    GroupJoinRequest,
    /// A user joined an open group.
    GroupMemberJoined,
    /// A join request was approved or rejected.
    GroupJoinResponse,
    /// A member was promoted to admin.
    GroupAdminPromoted,
    /// A member left the group.
    GroupMemberLeft,
    /// A member was removed by an admin.
    GroupMemberRemoved,
    /// The group was deleted.
    GroupDeleted,
}

impl NotificationType {
    /// Converts to the wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FriendRequest => "FRIEND_REQUEST",
            Self::FriendRequestRejected => "FRIEND_REQUEST_REJECTED",
            Self::FriendAdded => "FRIEND_ADDED",
            Self::FriendRemoved => "FRIEND_REMOVED",
            Self::GroupJoinRequest => "GROUP_JOIN_REQUEST",
            Self::GroupMemberJoined => "GROUP_MEMBER_JOINED",
            Self::GroupJoinResponse => "GROUP_JOIN_RESPONSE",
            Self::GroupAdminPromoted => "GROUP_ADMIN_PROMOTED",
            Self::GroupMemberLeft => "GROUP_MEMBER_LEFT",
            Self::GroupMemberRemoved => "GROUP_MEMBER_REMOVED",
            Self::GroupDeleted => "GROUP_DELETED",
        }
    }

    /// Parses from the wire string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FRIEND_REQUEST" => Some(Self::FriendRequest),
            "FRIEND_REQUEST_REJECTED" => Some(Self::FriendRequestRejected),
            "FRIEND_ADDED" => Some(Self::FriendAdded),
            "FRIEND_REMOVED" => Some(Self::FriendRemoved),
            "GROUP_JOIN_REQUEST" => Some(Self::GroupJoinRequest),
            "GROUP_MEMBER_JOINED" => Some(Self::GroupMemberJoined),
            "GROUP_JOIN_RESPONSE" => Some(Self::GroupJoinResponse),
            "GROUP_ADMIN_PROMOTED" => Some(Self::GroupAdminPromoted),
            "GROUP_MEMBER_LEFT" => Some(Self::GroupMemberLeft),
            "GROUP_MEMBER_REMOVED" => Some(Self::GroupMemberRemoved),
            "GROUP_DELETED" => Some(Self::GroupDeleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// User whose action caused the event, if any.
    pub source_user_id: Option<UserId>,
    /// User being notified.
    pub target_user_id: UserId,
    /// What happened.
    pub event_type: NotificationType,
    /// Human-readable summary.
    pub message: String,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(
        source_user_id: Option<UserId>,
        target_user_id: UserId,
        event_type: NotificationType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_user_id,
            target_user_id,
            event_type,
            message: message.into(),
        }
    }

    /// One notification per target, all sharing the same source, type and message.
    #[must_use]
    pub fn fan_out(
        source_user_id: Option<UserId>,
        targets: impl IntoIterator<Item = UserId>,
        event_type: NotificationType,
        message: &str,
    ) -> Vec<Self> {
        targets
            .into_iter()
            .map(|target| Self::new(source_user_id, target, event_type, message))
            .collect()
    }

    /// Serializes to JSON for delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
