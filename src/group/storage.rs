//! Row-level access to groups, admin sets, memberships and posts.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{
    Group, GroupId, GroupMembership, MembershipId, MembershipRole, MembershipStatus, Post, PostId,
};
use crate::error::{is_constraint_violation, Result, SocialError};
use crate::identity::UserId;

// ==================== Group Operations ====================

/// Inserts a group with an empty admin set and returns its id.
pub(crate) fn insert_group(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    is_open: bool,
    now: i64,
) -> Result<GroupId> {
    conn.execute(
        r"
        INSERT INTO user_groups (name, description, is_open, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        ",
        params![name, description, is_open, now],
    )
    .map_err(|e| name_conflict(e, name))?;

    Ok(GroupId(conn.last_insert_rowid()))
}

fn name_conflict(err: rusqlite::Error, name: &str) -> SocialError {
    if is_constraint_violation(&err) {
        SocialError::GroupNameTaken(name.to_string())
    } else {
        SocialError::Database(err)
    }
}

/// Retrieves a group together with its admin set.
pub(crate) fn get_group(conn: &Connection, id: GroupId) -> Result<Option<Group>> {
    let row = conn
        .query_row(
            r"
            SELECT id, name, description, is_open, created_at, updated_at
            FROM user_groups
            WHERE id = ?1
            ",
            params![id],
            |row| {
                let id: GroupId = row.get(0)?;
                let name: String = row.get(1)?;
                let description: Option<String> = row.get(2)?;
                let is_open: bool = row.get(3)?;
                let created_at: i64 = row.get(4)?;
                let updated_at: i64 = row.get(5)?;

                Ok((id, name, description, is_open, created_at, updated_at))
            },
        )
        .optional()?;

    match row {
        Some((id, name, description, is_open, created_at, updated_at)) => Ok(Some(Group {
            id,
            name,
            description,
            is_open,
            admins: admins(conn, id)?,
            created_at,
            updated_at,
        })),
        None => Ok(None),
    }
}

/// Replaces the group's name, description and open flag.
pub(crate) fn update_group(
    conn: &Connection,
    id: GroupId,
    name: &str,
    description: Option<&str>,
    is_open: bool,
    now: i64,
) -> Result<()> {
    let rows = conn
        .execute(
            r"
            UPDATE user_groups
            SET name = ?1, description = ?2, is_open = ?3, updated_at = ?4
            WHERE id = ?5
            ",
            params![name, description, is_open, now, id],
        )
        .map_err(|e| name_conflict(e, name))?;

    if rows == 0 {
        return Err(SocialError::GroupNotFound(id));
    }
    Ok(())
}

/// Deletes a group and everything that belongs to it.
///
/// Posts, memberships and admin entries go first so no row is left pointing
/// at a missing group.
pub(crate) fn delete_group_cascade(conn: &Connection, id: GroupId) -> Result<()> {
    conn.execute("DELETE FROM posts WHERE group_id = ?1", params![id])?;
    conn.execute(
        "DELETE FROM group_memberships WHERE group_id = ?1",
        params![id],
    )?;
    conn.execute("DELETE FROM group_admins WHERE group_id = ?1", params![id])?;
    let rows = conn.execute("DELETE FROM user_groups WHERE id = ?1", params![id])?;

    if rows == 0 {
        return Err(SocialError::GroupNotFound(id));
    }
    Ok(())
}

// ==================== Admin Set ====================

pub(crate) fn admins(conn: &Connection, group: GroupId) -> Result<BTreeSet<UserId>> {
    let mut stmt = conn.prepare("SELECT user_id FROM group_admins WHERE group_id = ?1")?;
    let admins = stmt
        .query_map(params![group], |row| row.get(0))?
        .collect::<std::result::Result<BTreeSet<UserId>, _>>()?;
    Ok(admins)
}

pub(crate) fn add_admin(conn: &Connection, group: GroupId, user: UserId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO group_admins (group_id, user_id) VALUES (?1, ?2)",
        params![group, user],
    )?;
    Ok(())
}

pub(crate) fn remove_admin(conn: &Connection, group: GroupId, user: UserId) -> Result<()> {
    conn.execute(
        "DELETE FROM group_admins WHERE group_id = ?1 AND user_id = ?2",
        params![group, user],
    )?;
    Ok(())
}

// ==================== Membership Operations ====================

const MEMBERSHIP_COLUMNS: &str = "id, user_id, group_id, role, status, joined_at, responded_at";

struct MembershipRow {
    id: MembershipId,
    user_id: UserId,
    group_id: GroupId,
    role: String,
    status: String,
    joined_at: i64,
    responded_at: Option<i64>,
}

impl MembershipRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            group_id: row.get(2)?,
            role: row.get(3)?,
            status: row.get(4)?,
            joined_at: row.get(5)?,
            responded_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<GroupMembership> {
        let role = MembershipRole::parse(&self.role)
            .ok_or_else(|| SocialError::InvalidData(format!("Invalid role: {}", self.role)))?;
        let status = MembershipStatus::parse(&self.status)
            .ok_or_else(|| SocialError::InvalidData(format!("Invalid status: {}", self.status)))?;

        Ok(GroupMembership {
            id: self.id,
            user_id: self.user_id,
            group_id: self.group_id,
            role,
            status,
            joined_at: self.joined_at,
            responded_at: self.responded_at,
        })
    }
}

/// Inserts a membership.
///
/// The `(user_id, group_id)` uniqueness constraint turns a concurrent
/// duplicate into [`SocialError::AlreadyMemberOrPending`].
pub(crate) fn insert_membership(
    conn: &Connection,
    user: UserId,
    group: GroupId,
    role: MembershipRole,
    status: MembershipStatus,
    now: i64,
) -> Result<GroupMembership> {
    let responded_at = (status != MembershipStatus::Pending).then_some(now);

    conn.execute(
        r"
        INSERT INTO group_memberships (user_id, group_id, role, status, joined_at, responded_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            user,
            group,
            role.as_str(),
            status.as_str(),
            now,
            responded_at
        ],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            SocialError::AlreadyMemberOrPending { user, group }
        } else {
            SocialError::Database(e)
        }
    })?;

    Ok(GroupMembership {
        id: MembershipId(conn.last_insert_rowid()),
        user_id: user,
        group_id: group,
        role,
        status,
        joined_at: now,
        responded_at,
    })
}

pub(crate) fn get_membership(
    conn: &Connection,
    user: UserId,
    group: GroupId,
) -> Result<Option<GroupMembership>> {
    conn.query_row(
        &format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships WHERE user_id = ?1 AND group_id = ?2"
        ),
        params![user, group],
        MembershipRow::from_row,
    )
    .optional()?
    .map(MembershipRow::decode)
    .transpose()
}

/// Sets the status of a membership, stamping `responded_at`.
pub(crate) fn set_membership_status(
    conn: &Connection,
    id: MembershipId,
    status: MembershipStatus,
    responded_at: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE group_memberships SET status = ?1, responded_at = ?2 WHERE id = ?3",
        params![status.as_str(), responded_at, id],
    )?;
    Ok(())
}

pub(crate) fn set_membership_role(
    conn: &Connection,
    id: MembershipId,
    role: MembershipRole,
) -> Result<()> {
    conn.execute(
        "UPDATE group_memberships SET role = ?1 WHERE id = ?2",
        params![role.as_str(), id],
    )?;
    Ok(())
}

pub(crate) fn delete_membership(conn: &Connection, id: MembershipId) -> Result<()> {
    conn.execute("DELETE FROM group_memberships WHERE id = ?1", params![id])?;
    Ok(())
}

/// Memberships of a group with the given status, oldest first.
pub(crate) fn memberships_with_status(
    conn: &Connection,
    group: GroupId,
    status: MembershipStatus,
) -> Result<Vec<GroupMembership>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships
         WHERE group_id = ?1 AND status = ?2
         ORDER BY joined_at, id"
    ))?;

    let rows = stmt
        .query_map(params![group, status.as_str()], MembershipRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(MembershipRow::decode).collect()
}

// ==================== Post Operations ====================

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        group_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn insert_post(
    conn: &Connection,
    group: GroupId,
    author: UserId,
    content: &str,
    now: i64,
) -> Result<Post> {
    conn.execute(
        "INSERT INTO posts (group_id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![group, author, content, now],
    )?;

    Ok(Post {
        id: PostId(conn.last_insert_rowid()),
        group_id: group,
        author_id: author,
        content: content.to_string(),
        created_at: now,
    })
}

pub(crate) fn get_post(conn: &Connection, id: PostId) -> Result<Option<Post>> {
    let post = conn
        .query_row(
            "SELECT id, group_id, author_id, content, created_at FROM posts WHERE id = ?1",
            params![id],
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

/// Posts of a group, newest first.
pub(crate) fn posts_of(conn: &Connection, group: GroupId) -> Result<Vec<Post>> {
    let mut stmt = conn.prepare(
        r"
        SELECT id, group_id, author_id, content, created_at
        FROM posts
        WHERE group_id = ?1
        ORDER BY created_at DESC, id DESC
        ",
    )?;
    let posts = stmt
        .query_map(params![group], post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub(crate) fn delete_post(conn: &Connection, id: PostId) -> Result<()> {
    conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(())
}
