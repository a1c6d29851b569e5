//! Friendship and friend request types.

use serde::{Deserialize, Serialize};

pub use crate::ids::RequestId;
use crate::ids::UserId;

/// Status of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Sent, awaiting a response.
    Pending,
    /// Accepted; the friendship exists.
    Accepted,
    /// Rejected by the receiver.
    Rejected,
}

impl RequestStatus {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns whether the request can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A one-directional proposal to become friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    /// Request identifier.
    pub id: RequestId,
    /// User who sent the request.
    pub requester_id: UserId,
    /// User the request is addressed to.
    pub receiver_id: UserId,
    /// Current status.
    pub status: RequestStatus,
    /// When the request was sent (Unix timestamp).
    pub created_at: i64,
    /// When the request was accepted or rejected (Unix timestamp).
    pub responded_at: Option<i64>,
}

/// One direction of a confirmed friendship.
///
/// A confirmed friendship is stored as two edges, `(a, b)` and `(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipEdge {
    /// User owning the edge.
    pub owner_id: UserId,
    /// The friend.
    pub friend_id: UserId,
    /// When the friendship was confirmed (Unix timestamp).
    pub since: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip_and_terminal() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Accepted.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert_eq!(RequestStatus::parse("declined"), None);
    }
}
