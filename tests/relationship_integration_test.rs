//! Integration tests for users, friend requests and friendships.
//!
//! These tests drive the public API through [`SocialCore`] and verify:
//! - Request lifecycle (send, accept, reject) and its notifications
//! - Friendship symmetry and removal
//! - Mutual-friend suggestions
//! - Persistence across reopen

mod helpers;

use helpers::{cleanup_dir, unique_temp_dir, TestCore};
use social_core::graph::RequestStatus;
use social_core::notify::NotificationType;
use social_core::{EngineConfig, ErrorKind, SocialCore, SocialError};

#[test]
fn request_accept_creates_symmetric_friendship() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice", "bob"]);
    let graph = t.core.relationships();

    let request = graph.send_request(ids[0], ids[1]).unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(graph.incoming_requests(ids[1]).unwrap().len(), 1);
    assert_eq!(graph.outgoing_requests(ids[0]).unwrap().len(), 1);

    graph.accept(request.id).unwrap();

    assert!(graph.are_friends(ids[0], ids[1]).unwrap());
    assert!(graph.are_friends(ids[1], ids[0]).unwrap());
    assert_eq!(graph.friendship_edges(ids[0]).unwrap().len(), 1);
    assert_eq!(graph.friendship_edges(ids[1]).unwrap().len(), 1);
    assert!(graph.incoming_requests(ids[1]).unwrap().is_empty());

    let stored = graph.get_request(request.id).unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
    assert!(stored.responded_at.is_some());

    let events = t.notifier.events();
    let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            NotificationType::FriendRequest,
            NotificationType::FriendAdded,
            NotificationType::FriendAdded,
        ]
    );
}

#[test]
fn request_notification_uses_display_name() {
    let t = TestCore::in_memory();
    let users = t.core.users();
    let alice = users.create_user("alice", Some("Alice A."), None).unwrap();
    let bob = users.create_user("bob", None, None).unwrap();

    t.core.relationships().send_request(alice.id, bob.id).unwrap();
    t.core.relationships().send_request(bob.id, alice.id).unwrap();

    assert_eq!(
        t.notifier.events_for(bob.id)[0].message,
        "Alice A. sent you a friend request"
    );
    assert_eq!(
        t.notifier.events_for(alice.id)[0].message,
        "bob sent you a friend request"
    );
}

#[test]
fn self_request_is_rejected() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice"]);

    let err = t
        .core
        .relationships()
        .send_request(ids[0], ids[0])
        .unwrap_err();
    assert!(matches!(err, SocialError::SelfReference));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(t.notifier.events().is_empty());
}

#[test]
fn duplicate_and_friend_requests_conflict() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice", "bob"]);
    let graph = t.core.relationships();

    let request = graph.send_request(ids[0], ids[1]).unwrap();
    let err = graph.send_request(ids[0], ids[1]).unwrap_err();
    assert!(matches!(err, SocialError::DuplicatePending(..)));

    graph.accept(request.id).unwrap();
    let err = graph.send_request(ids[1], ids[0]).unwrap_err();
    assert!(matches!(err, SocialError::AlreadyFriends(..)));
}

#[test]
fn request_to_unknown_user_is_not_found() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice"]);

    let err = t
        .core
        .relationships()
        .send_request(ids[0], social_core::UserId(404))
        .unwrap_err();
    assert!(matches!(err, SocialError::UserNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn reject_is_terminal() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice", "bob"]);
    let graph = t.core.relationships();

    let request = graph.send_request(ids[0], ids[1]).unwrap();
    graph.reject(request.id).unwrap();

    assert!(!graph.are_friends(ids[0], ids[1]).unwrap());
    let rejected = t.notifier.events_for(ids[0]);
    assert_eq!(rejected.len(), 1);
    assert_eq!(
        rejected[0].event_type,
        NotificationType::FriendRequestRejected
    );

    let err = graph.accept(request.id).unwrap_err();
    assert!(matches!(err, SocialError::InvalidState(_)));
    let err = graph.reject(request.id).unwrap_err();
    assert!(matches!(err, SocialError::InvalidState(_)));

    // A fresh request is allowed once the previous one is resolved.
    assert!(graph.send_request(ids[0], ids[1]).is_ok());
}

#[test]
fn accept_resolves_reverse_pending_request() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice", "bob"]);
    let graph = t.core.relationships();

    let forward = graph.send_request(ids[0], ids[1]).unwrap();
    let reverse = graph.send_request(ids[1], ids[0]).unwrap();

    graph.accept(forward.id).unwrap();

    let reverse = graph.get_request(reverse.id).unwrap().unwrap();
    assert_eq!(reverse.status, RequestStatus::Accepted);
    assert!(graph.incoming_requests(ids[0]).unwrap().is_empty());
    assert!(graph.are_friends(ids[0], ids[1]).unwrap());
}

#[test]
fn unknown_request_is_not_found() {
    let t = TestCore::in_memory();
    let err = t
        .core
        .relationships()
        .accept(social_core::RequestId(77))
        .unwrap_err();
    assert!(matches!(err, SocialError::RequestNotFound(_)));
}

#[test]
fn remove_friend_deletes_both_edges() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice", "bob"]);
    t.befriend(ids[0], ids[1]);
    t.clear_events();
    let graph = t.core.relationships();

    graph.remove_friend(ids[1], ids[0]).unwrap();

    assert!(!graph.are_friends(ids[0], ids[1]).unwrap());
    assert!(graph.friendship_edges(ids[0]).unwrap().is_empty());
    assert!(graph.friendship_edges(ids[1]).unwrap().is_empty());

    let events = t.notifier.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].target_user_id, ids[0]);
    assert_eq!(events[0].event_type, NotificationType::FriendRemoved);

    let err = graph.remove_friend(ids[1], ids[0]).unwrap_err();
    assert!(matches!(err, SocialError::FriendshipNotFound(..)));
}

#[test]
fn suggestions_rank_by_mutual_friends() {
    let t = TestCore::in_memory();
    let ids = t.users(&["me", "f1", "f2", "carol", "dave", "erin"]);
    let (me, f1, f2, carol, dave, erin) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]);

    t.befriend(me, f1);
    t.befriend(me, f2);
    // carol shares two friends with me, dave one.
    t.befriend(f1, carol);
    t.befriend(f2, carol);
    t.befriend(f1, dave);
    // erin is only reachable through carol: not a friend of a friend.
    t.befriend(carol, erin);

    let suggestions: Vec<_> = t
        .core
        .relationships()
        .suggest_friends(me)
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();

    assert_eq!(suggestions, vec![carol, dave]);
    assert!(!suggestions.contains(&me));
    assert!(!suggestions.contains(&f1));
    assert!(!suggestions.contains(&erin));
}

#[test]
fn suggestions_respect_configured_limit() {
    let t = TestCore::with_config(EngineConfig::default().with_suggestion_limit(1));
    let ids = t.users(&["me", "hub", "a", "b"]);
    t.befriend(ids[0], ids[1]);
    t.befriend(ids[1], ids[2]);
    t.befriend(ids[1], ids[3]);

    let suggestions = t.core.relationships().suggest_friends(ids[0]).unwrap();
    assert_eq!(suggestions.len(), 1);
}

#[test]
fn suggestions_empty_without_friends() {
    let t = TestCore::in_memory();
    let ids = t.users(&["loner"]);
    assert!(t
        .core
        .relationships()
        .suggest_friends(ids[0])
        .unwrap()
        .is_empty());
}

#[test]
fn list_friends_returns_profiles() {
    let t = TestCore::in_memory();
    let ids = t.users(&["alice", "bob", "carol"]);
    t.befriend(ids[0], ids[2]);
    t.befriend(ids[0], ids[1]);

    let names: Vec<_> = t
        .core
        .relationships()
        .list_friends(ids[0])
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(names, vec!["bob", "carol"]);
}

#[test]
fn profile_validation_reports_every_field() {
    let t = TestCore::in_memory();
    let long_bio = "x".repeat(501);

    let err = t
        .core
        .users()
        .create_user("", None, Some(&long_bio))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.messages().len(), 2);
}

#[test]
fn friendships_persist_across_reopen() {
    let dir = unique_temp_dir("reopen");
    let config = EngineConfig::new(&dir);

    let (alice, bob) = {
        let (core, _events) = SocialCore::open(config.clone()).unwrap();
        let alice = core.users().create_user("alice", None, None).unwrap().id;
        let bob = core.users().create_user("bob", None, None).unwrap().id;
        let request = core.relationships().send_request(alice, bob).unwrap();
        core.relationships().accept(request.id).unwrap();
        (alice, bob)
    };

    let (core, _events) = SocialCore::open(config).unwrap();
    assert!(core.relationships().are_friends(alice, bob).unwrap());
    assert_eq!(
        core.users()
            .find_by_username("bob")
            .unwrap()
            .map(|u| u.id),
        Some(bob)
    );

    drop(core);
    cleanup_dir(&dir);
}
