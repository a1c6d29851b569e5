//! Friendships and friend requests.
//!
//! # Architecture
//!
//! ```text
//! RelationshipGraph (workflow: validate → mutate → notify)
//!     ├── storage (friend_requests, friendships tables)
//!     └── Notifier (FRIEND_REQUEST, FRIEND_ADDED, ...)
//! ```
//!
//! A confirmed friendship is stored as two directed [`FriendshipEdge`]s.
//! A [`FriendRequest`] is resolved exactly once, as accepted or rejected.

mod manager;
pub(crate) mod storage;
mod types;

pub use manager::RelationshipGraph;
pub use types::{FriendRequest, FriendshipEdge, RequestId, RequestStatus};
