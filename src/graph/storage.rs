//! Row-level access to friendships and friend requests.
//!
//! Every function takes a borrowed connection so callers can compose several
//! of them inside one transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{FriendRequest, FriendshipEdge, RequestId, RequestStatus};
use crate::error::{is_constraint_violation, Result, SocialError};
use crate::identity::storage::user_from_row;
use crate::identity::{User, UserId};

const REQUEST_COLUMNS: &str = "id, requester_id, receiver_id, status, created_at, responded_at";

/// Request row before the status column is decoded.
struct RequestRow {
    id: RequestId,
    requester_id: UserId,
    receiver_id: UserId,
    status: String,
    created_at: i64,
    responded_at: Option<i64>,
}

impl RequestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            requester_id: row.get(1)?,
            receiver_id: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            responded_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<FriendRequest> {
        let status = RequestStatus::parse(&self.status).ok_or_else(|| {
            SocialError::InvalidData(format!("Invalid request status: {}", self.status))
        })?;
        Ok(FriendRequest {
            id: self.id,
            requester_id: self.requester_id,
            receiver_id: self.receiver_id,
            status,
            created_at: self.created_at,
            responded_at: self.responded_at,
        })
    }
}

// ==================== Friend Requests ====================

/// Inserts a pending request.
///
/// The partial unique index on pending requests turns a concurrent duplicate
/// into [`SocialError::DuplicatePending`].
pub(crate) fn insert_request(
    conn: &Connection,
    requester: UserId,
    receiver: UserId,
    created_at: i64,
) -> Result<FriendRequest> {
    conn.execute(
        r"
        INSERT INTO friend_requests (requester_id, receiver_id, status, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ",
        params![
            requester,
            receiver,
            RequestStatus::Pending.as_str(),
            created_at
        ],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            SocialError::DuplicatePending(requester, receiver)
        } else {
            SocialError::Database(e)
        }
    })?;

    Ok(FriendRequest {
        id: RequestId(conn.last_insert_rowid()),
        requester_id: requester,
        receiver_id: receiver,
        status: RequestStatus::Pending,
        created_at,
        responded_at: None,
    })
}

pub(crate) fn get_request(conn: &Connection, id: RequestId) -> Result<Option<FriendRequest>> {
    conn.query_row(
        &format!("SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = ?1"),
        params![id],
        RequestRow::from_row,
    )
    .optional()?
    .map(RequestRow::decode)
    .transpose()
}

/// Finds the pending request from `requester` to `receiver`, if any.
pub(crate) fn find_pending(
    conn: &Connection,
    requester: UserId,
    receiver: UserId,
) -> Result<Option<FriendRequest>> {
    conn.query_row(
        &format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests
             WHERE requester_id = ?1 AND receiver_id = ?2 AND status = ?3"
        ),
        params![requester, receiver, RequestStatus::Pending.as_str()],
        RequestRow::from_row,
    )
    .optional()?
    .map(RequestRow::decode)
    .transpose()
}

/// Moves a request to a new status.
pub(crate) fn set_request_status(
    conn: &Connection,
    id: RequestId,
    status: RequestStatus,
    responded_at: i64,
) -> Result<()> {
    let rows = conn.execute(
        "UPDATE friend_requests SET status = ?1, responded_at = ?2 WHERE id = ?3",
        params![status.as_str(), responded_at, id],
    )?;

    if rows == 0 {
        return Err(SocialError::RequestNotFound(id));
    }
    Ok(())
}

/// Pending requests addressed to `user`, newest first.
pub(crate) fn incoming_pending(conn: &Connection, user: UserId) -> Result<Vec<FriendRequest>> {
    list_pending(conn, "receiver_id", user)
}

/// Pending requests sent by `user`, newest first.
pub(crate) fn outgoing_pending(conn: &Connection, user: UserId) -> Result<Vec<FriendRequest>> {
    list_pending(conn, "requester_id", user)
}

fn list_pending(conn: &Connection, column: &str, user: UserId) -> Result<Vec<FriendRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests
         WHERE {column} = ?1 AND status = ?2
         ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt
        .query_map(
            params![user, RequestStatus::Pending.as_str()],
            RequestRow::from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(RequestRow::decode).collect()
}

// ==================== Friendship Edges ====================

/// Inserts both directed edges of a friendship.
///
/// Existing edges are left in place, so this also repairs a half-present pair.
pub(crate) fn insert_edge_pair(conn: &Connection, a: UserId, b: UserId, since: i64) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO friendships (owner_id, friend_id, since) VALUES (?1, ?2, ?3)",
    )?;
    stmt.execute(params![a, b, since])?;
    stmt.execute(params![b, a, since])?;
    Ok(())
}

/// Deletes both directed edges and returns how many were removed.
pub(crate) fn delete_edge_pair(conn: &Connection, a: UserId, b: UserId) -> Result<usize> {
    let rows = conn.execute(
        r"
        DELETE FROM friendships
        WHERE (owner_id = ?1 AND friend_id = ?2) OR (owner_id = ?2 AND friend_id = ?1)
        ",
        params![a, b],
    )?;
    Ok(rows)
}

/// Returns `true` if an edge exists in either direction.
pub(crate) fn either_edge_exists(conn: &Connection, a: UserId, b: UserId) -> Result<bool> {
    let exists = conn.query_row(
        r"
        SELECT EXISTS(
            SELECT 1 FROM friendships
            WHERE (owner_id = ?1 AND friend_id = ?2) OR (owner_id = ?2 AND friend_id = ?1)
        )
        ",
        params![a, b],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Outgoing edges of `user`.
pub(crate) fn edges_of(conn: &Connection, user: UserId) -> Result<Vec<FriendshipEdge>> {
    let mut stmt = conn.prepare(
        "SELECT owner_id, friend_id, since FROM friendships WHERE owner_id = ?1 ORDER BY friend_id",
    )?;
    let edges = stmt
        .query_map(params![user], |row| {
            Ok(FriendshipEdge {
                owner_id: row.get(0)?,
                friend_id: row.get(1)?,
                since: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(edges)
}

/// Users reachable over one outgoing edge from `user`.
pub(crate) fn friends_of(conn: &Connection, user: UserId) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(
        r"
        SELECT u.id, u.username, u.display_name, u.bio, u.created_at
        FROM friendships f
        JOIN users u ON u.id = f.friend_id
        WHERE f.owner_id = ?1
        ORDER BY u.username
        ",
    )?;
    let users = stmt
        .query_map(params![user], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Friends of friends of `user`, excluding `user` and its direct friends.
///
/// Edges are read in both directions so a half-present pair still counts as
/// a friendship. Ranked by number of mutual friends.
pub(crate) fn suggestions(conn: &Connection, user: UserId, limit: usize) -> Result<Vec<User>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        r"
        WITH adjacency(a, b) AS (
            SELECT owner_id, friend_id FROM friendships
            UNION
            SELECT friend_id, owner_id FROM friendships
        ),
        direct(id) AS (
            SELECT b FROM adjacency WHERE a = ?1
        )
        SELECT u.id, u.username, u.display_name, u.bio, u.created_at
        FROM direct d
        JOIN adjacency fof ON fof.a = d.id
        JOIN users u ON u.id = fof.b
        WHERE fof.b <> ?1
          AND fof.b NOT IN (SELECT id FROM direct)
        GROUP BY u.id
        ORDER BY COUNT(*) DESC, u.id
        LIMIT ?2
        ",
    )?;
    let users = stmt
        .query_map(params![user, limit], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}
