//! Friendship workflow.
//!
//! [`RelationshipGraph`] owns friend requests and friendship edges. Each
//! operation validates and mutates inside one transaction, then emits
//! notifications after the commit.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::storage;
use super::types::{FriendRequest, FriendshipEdge, RequestId, RequestStatus};
use crate::db::Database;
use crate::error::{Result, SocialError};
use crate::identity::storage::{load_user, require_user};
use crate::identity::{User, UserId};
use crate::notify::{emit_all, Notification, NotificationType, Notifier};

/// Friend requests and confirmed friendships.
///
/// # Invariants
///
/// - A confirmed friendship is two directed edges written in the same
///   transaction; both exist or neither does.
/// - At most one pending request exists per ordered pair of users.
/// - Accepting a request also resolves a pending request in the opposite
///   direction, so a friendship and a pending request never coexist.
pub struct RelationshipGraph {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
    suggestion_limit: usize,
}

impl RelationshipGraph {
    /// Creates the workflow.
    #[must_use]
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>, suggestion_limit: usize) -> Self {
        Self {
            db,
            notifier,
            suggestion_limit,
        }
    }

    // ==================== Requests ====================

    /// Sends a friend request.
    ///
    /// # Errors
    ///
    /// - [`SocialError::SelfReference`] if both ids are equal
    /// - [`SocialError::UserNotFound`] if either user doesn't exist
    /// - [`SocialError::AlreadyFriends`] if an edge exists in either direction
    /// - [`SocialError::DuplicatePending`] if a pending request from
    ///   `requester` to `receiver` exists
    #[instrument(skip(self))]
    pub fn send_request(&self, requester: UserId, receiver: UserId) -> Result<FriendRequest> {
        if requester == receiver {
            return Err(SocialError::SelfReference);
        }

        let now = chrono::Utc::now().timestamp();
        let (request, sender) = self.db.transaction(|tx| {
            let sender = load_user(tx, requester)?;
            require_user(tx, receiver)?;

            if storage::either_edge_exists(tx, requester, receiver)? {
                return Err(SocialError::AlreadyFriends(requester, receiver));
            }
            if storage::find_pending(tx, requester, receiver)?.is_some() {
                return Err(SocialError::DuplicatePending(requester, receiver));
            }

            let request = storage::insert_request(tx, requester, receiver, now)?;
            Ok((request, sender))
        })?;

        info!(request_id = %request.id, "friend request sent");
        emit_all(
            self.notifier.as_ref(),
            vec![Notification::new(
                Some(requester),
                receiver,
                NotificationType::FriendRequest,
                format!("{} sent you a friend request", sender.label()),
            )],
        );

        Ok(request)
    }

    /// Accepts a pending request and creates the friendship.
    ///
    /// # Errors
    ///
    /// - [`SocialError::RequestNotFound`] if no such request exists
    /// - [`SocialError::InvalidState`] if the request is not pending
    #[instrument(skip(self))]
    pub fn accept(&self, request_id: RequestId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let request = self.db.transaction(|tx| {
            let request = Self::pending_request(tx, request_id)?;

            storage::set_request_status(tx, request.id, RequestStatus::Accepted, now)?;
            storage::insert_edge_pair(tx, request.requester_id, request.receiver_id, now)?;

            if let Some(reverse) =
                storage::find_pending(tx, request.receiver_id, request.requester_id)?
            {
                debug!(reverse_id = %reverse.id, "resolving reverse request");
                storage::set_request_status(tx, reverse.id, RequestStatus::Accepted, now)?;
            }

            Ok(request)
        })?;

        let (requester, receiver) = (request.requester_id, request.receiver_id);
        info!(%requester, %receiver, "friendship confirmed");
        emit_all(
            self.notifier.as_ref(),
            vec![
                Notification::new(
                    Some(receiver),
                    requester,
                    NotificationType::FriendAdded,
                    format!("User {receiver} accepted your friend request"),
                ),
                Notification::new(
                    Some(requester),
                    receiver,
                    NotificationType::FriendAdded,
                    format!("You are now friends with user {requester}"),
                ),
            ],
        );

        Ok(())
    }

    /// Rejects a pending request. No friendship is created.
    ///
    /// # Errors
    ///
    /// - [`SocialError::RequestNotFound`] if no such request exists
    /// - [`SocialError::InvalidState`] if the request is not pending
    #[instrument(skip(self))]
    pub fn reject(&self, request_id: RequestId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let request = self.db.transaction(|tx| {
            let request = Self::pending_request(tx, request_id)?;
            storage::set_request_status(tx, request.id, RequestStatus::Rejected, now)?;
            Ok(request)
        })?;

        info!(%request_id, "friend request rejected");
        emit_all(
            self.notifier.as_ref(),
            vec![Notification::new(
                Some(request.receiver_id),
                request.requester_id,
                NotificationType::FriendRequestRejected,
                format!("User {} declined your friend request", request.receiver_id),
            )],
        );

        Ok(())
    }

    fn pending_request(
        conn: &rusqlite::Connection,
        request_id: RequestId,
    ) -> Result<FriendRequest> {
        let request =
            storage::get_request(conn, request_id)?.ok_or(SocialError::RequestNotFound(request_id))?;

        if request.status.is_terminal() {
            return Err(SocialError::InvalidState(format!(
                "Friend request {request_id} already {}",
                request.status.as_str()
            )));
        }
        Ok(request)
    }

    /// Retrieves a request by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_request(&self, request_id: RequestId) -> Result<Option<FriendRequest>> {
        self.db.read(|conn| storage::get_request(conn, request_id))
    }

    /// Pending requests addressed to `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn incoming_requests(&self, user: UserId) -> Result<Vec<FriendRequest>> {
        self.db.read(|conn| storage::incoming_pending(conn, user))
    }

    /// Pending requests sent by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn outgoing_requests(&self, user: UserId) -> Result<Vec<FriendRequest>> {
        self.db.read(|conn| storage::outgoing_pending(conn, user))
    }

    // ==================== Friendships ====================

    /// Returns `true` if the users are friends.
    ///
    /// Either directed edge is enough, so a pair left half-written by a
    /// failure outside this crate still reads as friends.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn are_friends(&self, a: UserId, b: UserId) -> Result<bool> {
        if a == b {
            return Ok(false);
        }
        self.db.read(|conn| storage::either_edge_exists(conn, a, b))
    }

    /// Users reachable over one outgoing edge from `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_friends(&self, user: UserId) -> Result<Vec<User>> {
        self.db.read(|conn| storage::friends_of(conn, user))
    }

    /// Outgoing friendship edges of `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn friendship_edges(&self, user: UserId) -> Result<Vec<FriendshipEdge>> {
        self.db.read(|conn| storage::edges_of(conn, user))
    }

    /// Friends of friends who are neither `user` nor already friends.
    ///
    /// The result is a snapshot taken at call time, ranked by number of
    /// mutual friends and capped at the configured suggestion limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[instrument(skip(self))]
    pub fn suggest_friends(&self, user: UserId) -> Result<Vec<User>> {
        let suggestions = self
            .db
            .read(|conn| storage::suggestions(conn, user, self.suggestion_limit))?;
        debug!(count = suggestions.len(), "computed friend suggestions");
        Ok(suggestions)
    }

    /// Ends a friendship, deleting both edges.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::FriendshipNotFound`] if the users aren't friends.
    #[instrument(skip(self))]
    pub fn remove_friend(&self, user: UserId, friend: UserId) -> Result<()> {
        let removed = self
            .db
            .transaction(|tx| storage::delete_edge_pair(tx, user, friend))?;
        if removed == 0 {
            return Err(SocialError::FriendshipNotFound(user, friend));
        }

        info!("friendship removed");
        emit_all(
            self.notifier.as_ref(),
            vec![Notification::new(
                Some(user),
                friend,
                NotificationType::FriendRemoved,
                format!("User {user} removed you as a friend"),
            )],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::storage::insert_user;
    use crate::notify::MemoryNotifier;

    struct Fixture {
        graph: RelationshipGraph,
        notifier: Arc<MemoryNotifier>,
        users: Vec<UserId>,
    }

    fn fixture(n: usize) -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let users = db
            .transaction(|tx| {
                (0..n)
                    .map(|i| insert_user(tx, &format!("user{i}"), None, None, 0).map(|u| u.id))
                    .collect()
            })
            .unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let graph = RelationshipGraph::new(db, notifier.clone(), 20);
        Fixture {
            graph,
            notifier,
            users,
        }
    }

    fn befriend(f: &Fixture, a: usize, b: usize) {
        let request = f.graph.send_request(f.users[a], f.users[b]).unwrap();
        f.graph.accept(request.id).unwrap();
    }

    #[test]
    fn request_notification_names_the_sender() {
        let f = fixture(2);
        f.graph.send_request(f.users[0], f.users[1]).unwrap();

        let events = f.notifier.events_for(f.users[1]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "user0 sent you a friend request");
    }

    #[test]
    fn self_request_fails() {
        let f = fixture(1);
        let err = f.graph.send_request(f.users[0], f.users[0]).unwrap_err();
        assert!(matches!(err, SocialError::SelfReference));
    }

    #[test]
    fn request_to_unknown_user_fails() {
        let f = fixture(1);
        let err = f.graph.send_request(f.users[0], UserId(999)).unwrap_err();
        assert!(matches!(err, SocialError::UserNotFound(UserId(999))));
    }

    #[test]
    fn duplicate_pending_fails() {
        let f = fixture(2);
        f.graph.send_request(f.users[0], f.users[1]).unwrap();
        let err = f.graph.send_request(f.users[0], f.users[1]).unwrap_err();
        assert!(matches!(err, SocialError::DuplicatePending(..)));
    }

    #[test]
    fn reverse_direction_request_is_allowed_while_pending() {
        let f = fixture(2);
        f.graph.send_request(f.users[0], f.users[1]).unwrap();
        assert!(f.graph.send_request(f.users[1], f.users[0]).is_ok());
    }

    #[test]
    fn accept_creates_both_edges_and_notifies_both() {
        let f = fixture(2);
        let request = f.graph.send_request(f.users[0], f.users[1]).unwrap();
        let _ = f.notifier.drain();

        f.graph.accept(request.id).unwrap();

        assert!(f.graph.are_friends(f.users[0], f.users[1]).unwrap());
        assert!(f.graph.are_friends(f.users[1], f.users[0]).unwrap());
        assert_eq!(f.graph.friendship_edges(f.users[0]).unwrap().len(), 1);
        assert_eq!(f.graph.friendship_edges(f.users[1]).unwrap().len(), 1);

        let events = f.notifier.drain();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| e.event_type == NotificationType::FriendAdded));
        let stored = f.graph.get_request(request.id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Accepted);
        assert!(stored.responded_at.is_some());
    }

    #[test]
    fn accept_resolves_reverse_pending_request() {
        let f = fixture(2);
        let forward = f.graph.send_request(f.users[0], f.users[1]).unwrap();
        let reverse = f.graph.send_request(f.users[1], f.users[0]).unwrap();

        f.graph.accept(forward.id).unwrap();

        let reverse = f.graph.get_request(reverse.id).unwrap().unwrap();
        assert_eq!(reverse.status, RequestStatus::Accepted);
        assert!(f.graph.incoming_requests(f.users[0]).unwrap().is_empty());
    }

    #[test]
    fn accept_twice_is_invalid_state() {
        let f = fixture(2);
        let request = f.graph.send_request(f.users[0], f.users[1]).unwrap();
        f.graph.accept(request.id).unwrap();
        let err = f.graph.accept(request.id).unwrap_err();
        assert!(matches!(err, SocialError::InvalidState(_)));
    }

    #[test]
    fn accept_unknown_request_is_not_found() {
        let f = fixture(0);
        let err = f.graph.accept(RequestId(77)).unwrap_err();
        assert!(matches!(err, SocialError::RequestNotFound(RequestId(77))));
    }

    #[test]
    fn reject_creates_no_edges() {
        let f = fixture(2);
        let request = f.graph.send_request(f.users[0], f.users[1]).unwrap();
        f.graph.reject(request.id).unwrap();

        assert!(!f.graph.are_friends(f.users[0], f.users[1]).unwrap());
        let err = f.graph.accept(request.id).unwrap_err();
        assert!(matches!(err, SocialError::InvalidState(_)));
        assert_eq!(
            f.notifier.events_for(f.users[0])[0].event_type,
            NotificationType::FriendRequestRejected
        );
    }

    #[test]
    fn request_between_friends_fails() {
        let f = fixture(2);
        befriend(&f, 0, 1);
        let err = f.graph.send_request(f.users[1], f.users[0]).unwrap_err();
        assert!(matches!(err, SocialError::AlreadyFriends(..)));
    }

    #[test]
    fn suggestions_exclude_self_and_friends() {
        let f = fixture(4);
        befriend(&f, 0, 1);
        befriend(&f, 1, 2);
        befriend(&f, 0, 2);
        befriend(&f, 2, 3);

        let suggested: Vec<_> = f
            .graph
            .suggest_friends(f.users[0])
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(suggested, vec![f.users[3]]);
    }

    #[test]
    fn list_friends_returns_outgoing_edges() {
        let f = fixture(3);
        befriend(&f, 0, 1);
        befriend(&f, 2, 0);

        let names: Vec<_> = f
            .graph
            .list_friends(f.users[0])
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["user1".to_string(), "user2".to_string()]);
    }

    #[test]
    fn remove_friend_deletes_both_edges() {
        let f = fixture(2);
        befriend(&f, 0, 1);
        f.graph.remove_friend(f.users[1], f.users[0]).unwrap();

        assert!(!f.graph.are_friends(f.users[0], f.users[1]).unwrap());
        let err = f.graph.remove_friend(f.users[1], f.users[0]).unwrap_err();
        assert!(matches!(err, SocialError::FriendshipNotFound(..)));
    }

    #[test]
    fn are_friends_with_self_is_false() {
        let f = fixture(1);
        assert!(!f.graph.are_friends(f.users[0], f.users[0]).unwrap());
    }
}
