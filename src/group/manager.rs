//! Group membership workflow.
//!
//! [`GroupMembershipWorkflow`] owns groups, their admin sets, membership
//! records and posts. Every mutating operation runs its checks and writes in
//! one transaction, so the admin set can't be emptied by two admins leaving
//! at the same time. Notifications go out after the commit.
//!
//! # Membership lifecycle
//!
//! ```text
//! request_join ──▶ pending ──respond──▶ approved ──leave/remove──▶ (deleted)
//!      │                  └───respond──▶ rejected
//!      └── open group or admin ──▶ approved
//! ```

use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use super::storage;
use super::types::{
    Group, GroupConfig, GroupId, GroupMembership, MembershipRole, MembershipStatus, Post, PostId,
};
use crate::config::ContentLimits;
use crate::db::Database;
use crate::error::{Result, SocialError};
use crate::identity::storage::require_user;
use crate::identity::UserId;
use crate::notify::{emit_all, Notification, NotificationType, Notifier};
use crate::validation::Validator;

/// Groups, memberships, admin sets and posts.
///
/// # Invariants
///
/// - At most one membership per user and group.
/// - Every admin holds an approved membership with the admin role.
/// - A group's admin set is never empty.
pub struct GroupMembershipWorkflow {
    db: Arc<Database>,
    notifier: Arc<dyn Notifier>,
    limits: ContentLimits,
}

impl GroupMembershipWorkflow {
    /// Creates the workflow.
    #[must_use]
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>, limits: ContentLimits) -> Self {
        Self {
            db,
            notifier,
            limits,
        }
    }

    fn require_group(conn: &Connection, id: GroupId) -> Result<Group> {
        storage::get_group(conn, id)?.ok_or(SocialError::GroupNotFound(id))
    }

    fn require_membership(
        conn: &Connection,
        user: UserId,
        group: GroupId,
    ) -> Result<GroupMembership> {
        storage::get_membership(conn, user, group)?
            .ok_or(SocialError::MembershipNotFound { user, group })
    }

    fn require_admin(group: &Group, actor: UserId) -> Result<()> {
        if group.is_admin(actor) {
            Ok(())
        } else {
            Err(SocialError::Forbidden(format!(
                "User {actor} is not an admin of group {}",
                group.id
            )))
        }
    }

    fn validate_config(&self, config: &GroupConfig) -> Result<()> {
        Validator::new()
            .required("group name", &config.name, self.limits.max_group_name_len)
            .optional(
                "description",
                config.description.as_deref(),
                self.limits.max_description_len,
            )
            .finish()
    }

    /// Inserts the membership produced by a join attempt.
    ///
    /// Admins join approved with the admin role; anyone else joins approved
    /// in an open group and pending in a closed one.
    fn insert_join(
        conn: &Connection,
        user: UserId,
        group: &Group,
        now: i64,
    ) -> Result<GroupMembership> {
        if storage::get_membership(conn, user, group.id)?.is_some() {
            return Err(SocialError::AlreadyMemberOrPending {
                user,
                group: group.id,
            });
        }

        let (role, status) = if group.is_admin(user) {
            (MembershipRole::Admin, MembershipStatus::Approved)
        } else if group.is_open {
            (MembershipRole::Member, MembershipStatus::Approved)
        } else {
            (MembershipRole::Member, MembershipStatus::Pending)
        };

        storage::insert_membership(conn, user, group.id, role, status, now)
    }

    // ==================== Group Lifecycle ====================

    /// Creates a group with `creator` as its only admin.
    ///
    /// # Errors
    ///
    /// - [`SocialError::Validation`] for an invalid name or description
    /// - [`SocialError::UserNotFound`] if the creator doesn't exist
    /// - [`SocialError::GroupNameTaken`] if the name is in use
    #[instrument(skip(self, config), fields(name = %config.name))]
    pub fn create_group(&self, creator: UserId, config: &GroupConfig) -> Result<Group> {
        self.validate_config(config)?;

        let now = chrono::Utc::now().timestamp();
        let group = self.db.transaction(|tx| {
            require_user(tx, creator)?;
            let id = storage::insert_group(
                tx,
                &config.name,
                config.description.as_deref(),
                config.is_open,
                now,
            )?;
            storage::add_admin(tx, id, creator)?;

            let group = Self::require_group(tx, id)?;
            Self::insert_join(tx, creator, &group, now)?;
            Ok(group)
        })?;

        info!(group_id = %group.id, "group created");
        Ok(group)
    }

    /// Retrieves a group with its admin set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_group(&self, group: GroupId) -> Result<Option<Group>> {
        self.db.read(|conn| storage::get_group(conn, group))
    }

    /// Changes a group's name, description and open flag.
    ///
    /// Pending requests stay pending when a group is opened.
    ///
    /// # Errors
    ///
    /// - [`SocialError::Validation`] for an invalid name or description
    /// - [`SocialError::GroupNotFound`] if the group doesn't exist
    /// - [`SocialError::Forbidden`] unless `admin` administers the group
    /// - [`SocialError::GroupNameTaken`] if the new name is in use
    #[instrument(skip(self, config))]
    pub fn update_group(
        &self,
        admin: UserId,
        group: GroupId,
        config: &GroupConfig,
    ) -> Result<Group> {
        self.validate_config(config)?;

        let now = chrono::Utc::now().timestamp();
        self.db.transaction(|tx| {
            let existing = Self::require_group(tx, group)?;
            Self::require_admin(&existing, admin)?;
            storage::update_group(
                tx,
                group,
                &config.name,
                config.description.as_deref(),
                config.is_open,
                now,
            )?;
            Self::require_group(tx, group)
        })
    }

    /// Deletes a group with all of its memberships and posts.
    ///
    /// # Errors
    ///
    /// - [`SocialError::GroupNotFound`] if the group doesn't exist
    /// - [`SocialError::Forbidden`] unless `admin` administers the group
    #[instrument(skip(self))]
    pub fn delete_group(&self, admin: UserId, group: GroupId) -> Result<()> {
        let (name, members) = self.db.transaction(|tx| {
            let existing = Self::require_group(tx, group)?;
            Self::require_admin(&existing, admin)?;

            let members: Vec<UserId> =
                storage::memberships_with_status(tx, group, MembershipStatus::Approved)?
                    .into_iter()
                    .map(|m| m.user_id)
                    .filter(|&user| user != admin)
                    .collect();

            storage::delete_group_cascade(tx, group)?;
            Ok((existing.name, members))
        })?;

        info!(notified = members.len(), "group deleted");
        emit_all(
            self.notifier.as_ref(),
            Notification::fan_out(
                Some(admin),
                members,
                NotificationType::GroupDeleted,
                &format!("Group '{name}' was deleted"),
            ),
        );
        Ok(())
    }

    // ==================== Membership ====================

    /// Asks to join a group.
    ///
    /// The membership is approved at once if the group is open or `user` is
    /// already an admin, and pending otherwise. Admins are notified of every
    /// join by a non-admin.
    ///
    /// # Errors
    ///
    /// - [`SocialError::UserNotFound`] / [`SocialError::GroupNotFound`]
    /// - [`SocialError::AlreadyMemberOrPending`] if any membership record
    ///   exists for the pair
    #[instrument(skip(self))]
    pub fn request_join(&self, user: UserId, group: GroupId) -> Result<GroupMembership> {
        let now = chrono::Utc::now().timestamp();
        let (membership, existing) = self.db.transaction(|tx| {
            require_user(tx, user)?;
            let existing = Self::require_group(tx, group)?;
            let membership = Self::insert_join(tx, user, &existing, now)?;
            Ok((membership, existing))
        })?;

        info!(status = membership.status.as_str(), "join requested");

        if membership.role != MembershipRole::Admin {
            let (event_type, message) = if membership.status == MembershipStatus::Pending {
                (
                    NotificationType::GroupJoinRequest,
                    format!("User {user} asked to join '{}'", existing.name),
                )
            } else {
                (
                    NotificationType::GroupMemberJoined,
                    format!("User {user} joined '{}'", existing.name),
                )
            };
            emit_all(
                self.notifier.as_ref(),
                Notification::fan_out(Some(user), existing.admins, event_type, &message),
            );
        }

        Ok(membership)
    }

    /// Pending join requests for a group, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::GroupNotFound`] if the group doesn't exist.
    pub fn list_pending(&self, group: GroupId) -> Result<Vec<GroupMembership>> {
        self.db.read(|conn| {
            Self::require_group(conn, group)?;
            storage::memberships_with_status(conn, group, MembershipStatus::Pending)
        })
    }

    /// Approved members of a group, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::GroupNotFound`] if the group doesn't exist.
    pub fn list_members(&self, group: GroupId) -> Result<Vec<GroupMembership>> {
        self.db.read(|conn| {
            Self::require_group(conn, group)?;
            storage::memberships_with_status(conn, group, MembershipStatus::Approved)
        })
    }

    /// Admins of a group, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::GroupNotFound`] if the group doesn't exist.
    pub fn list_admins(&self, group: GroupId) -> Result<Vec<UserId>> {
        self.db.read(|conn| {
            let group = Self::require_group(conn, group)?;
            Ok(group.admins.into_iter().collect())
        })
    }

    /// Retrieves the membership of `user` in `group`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_membership(&self, user: UserId, group: GroupId) -> Result<Option<GroupMembership>> {
        self.db
            .read(|conn| storage::get_membership(conn, user, group))
    }

    /// Approves or rejects a pending join request.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::MembershipNotFound`] if there is no pending
    /// membership for the pair.
    #[instrument(skip(self))]
    pub fn respond(&self, group: GroupId, user: UserId, approve: bool) -> Result<GroupMembership> {
        let status = if approve {
            MembershipStatus::Approved
        } else {
            MembershipStatus::Rejected
        };

        let now = chrono::Utc::now().timestamp();
        let (membership, name) = self.db.transaction(|tx| {
            let existing = Self::require_group(tx, group)?;
            let membership = storage::get_membership(tx, user, group)?
                .filter(|m| m.status == MembershipStatus::Pending)
                .ok_or(SocialError::MembershipNotFound { user, group })?;

            storage::set_membership_status(tx, membership.id, status, now)?;
            Ok((
                GroupMembership {
                    status,
                    responded_at: Some(now),
                    ..membership
                },
                existing.name,
            ))
        })?;

        info!(status = status.as_str(), "join request answered");
        let verdict = if approve { "approved" } else { "rejected" };
        emit_all(
            self.notifier.as_ref(),
            vec![Notification::new(
                None,
                user,
                NotificationType::GroupJoinResponse,
                format!("Your request to join '{name}' was {verdict}"),
            )],
        );

        Ok(membership)
    }

    /// Makes an approved member an admin.
    ///
    /// Promoting an existing admin changes nothing and sends no notification.
    ///
    /// # Errors
    ///
    /// - [`SocialError::GroupNotFound`] if the group doesn't exist
    /// - [`SocialError::MembershipNotFound`] if `user` has no membership
    /// - [`SocialError::InvalidState`] unless the membership is approved
    #[instrument(skip(self))]
    pub fn promote_to_admin(&self, group: GroupId, user: UserId) -> Result<GroupMembership> {
        let (membership, promoted, name) = self.db.transaction(|tx| {
            let existing = Self::require_group(tx, group)?;
            let membership = Self::require_membership(tx, user, group)?;

            if membership.status != MembershipStatus::Approved {
                return Err(SocialError::InvalidState(format!(
                    "Cannot promote user {user}: membership is {}",
                    membership.status.as_str()
                )));
            }
            if membership.role == MembershipRole::Admin && existing.is_admin(user) {
                return Ok((membership, false, existing.name));
            }

            storage::set_membership_role(tx, membership.id, MembershipRole::Admin)?;
            storage::add_admin(tx, group, user)?;
            Ok((
                GroupMembership {
                    role: MembershipRole::Admin,
                    ..membership
                },
                true,
                existing.name,
            ))
        })?;

        if promoted {
            info!("member promoted to admin");
            emit_all(
                self.notifier.as_ref(),
                vec![Notification::new(
                    None,
                    user,
                    NotificationType::GroupAdminPromoted,
                    format!("You are now an admin of '{name}'"),
                )],
            );
        } else {
            debug!("user already an admin");
        }

        Ok(membership)
    }

    /// Leaves a group.
    ///
    /// # Errors
    ///
    /// - [`SocialError::GroupNotFound`] if the group doesn't exist
    /// - [`SocialError::MembershipNotFound`] if `user` has no membership
    /// - [`SocialError::InvalidState`] for a pending or rejected membership
    /// - [`SocialError::LastAdminProtection`] if `user` is the only admin
    #[instrument(skip(self))]
    pub fn leave_group(&self, user: UserId, group: GroupId) -> Result<()> {
        let (remaining_admins, name) = self.db.transaction(|tx| {
            let mut existing = Self::require_group(tx, group)?;
            let membership = Self::require_membership(tx, user, group)?;

            if membership.status != MembershipStatus::Approved {
                return Err(SocialError::InvalidState(format!(
                    "Cannot leave group {group}: membership is {}",
                    membership.status.as_str()
                )));
            }
            if existing.is_admin(user) && existing.admins.len() == 1 {
                return Err(SocialError::LastAdminProtection { user, group });
            }

            storage::delete_membership(tx, membership.id)?;
            storage::remove_admin(tx, group, user)?;
            existing.admins.remove(&user);
            Ok((existing.admins, existing.name))
        })?;

        info!("member left group");
        emit_all(
            self.notifier.as_ref(),
            Notification::fan_out(
                Some(user),
                remaining_admins,
                NotificationType::GroupMemberLeft,
                &format!("User {user} left '{name}'"),
            ),
        );
        Ok(())
    }

    /// Removes a user's membership on behalf of an admin.
    ///
    /// Works for memberships in any status.
    ///
    /// # Errors
    ///
    /// - [`SocialError::GroupNotFound`] if the group doesn't exist
    /// - [`SocialError::Forbidden`] unless `admin` administers the group
    /// - [`SocialError::MembershipNotFound`] if `target` has no membership
    /// - [`SocialError::LastAdminProtection`] if it would leave no admin
    #[instrument(skip(self))]
    pub fn remove_user_from_group(
        &self,
        admin: UserId,
        target: UserId,
        group: GroupId,
    ) -> Result<()> {
        let name = self.db.transaction(|tx| {
            let existing = Self::require_group(tx, group)?;
            Self::require_admin(&existing, admin)?;
            let membership = Self::require_membership(tx, target, group)?;

            if existing.is_admin(target) && existing.admins.len() == 1 {
                return Err(SocialError::LastAdminProtection {
                    user: target,
                    group,
                });
            }

            storage::delete_membership(tx, membership.id)?;
            storage::remove_admin(tx, group, target)?;
            Ok(existing.name)
        })?;

        info!("member removed from group");
        if target != admin {
            emit_all(
                self.notifier.as_ref(),
                vec![Notification::new(
                    Some(admin),
                    target,
                    NotificationType::GroupMemberRemoved,
                    format!("You were removed from '{name}'"),
                )],
            );
        }
        Ok(())
    }

    // ==================== Posts ====================

    /// Publishes a post in a group.
    ///
    /// # Errors
    ///
    /// - [`SocialError::Validation`] for empty or oversized content
    /// - [`SocialError::GroupNotFound`] if the group doesn't exist
    /// - [`SocialError::Forbidden`] unless `author` is an approved member
    #[instrument(skip(self, content))]
    pub fn create_post(&self, author: UserId, group: GroupId, content: &str) -> Result<Post> {
        Validator::new()
            .required("content", content, self.limits.max_post_len)
            .finish()?;

        let now = chrono::Utc::now().timestamp();
        let post = self.db.transaction(|tx| {
            Self::require_group(tx, group)?;
            let approved = storage::get_membership(tx, author, group)?
                .is_some_and(|m| m.status == MembershipStatus::Approved);
            if !approved {
                return Err(SocialError::Forbidden(format!(
                    "User {author} is not a member of group {group}"
                )));
            }
            storage::insert_post(tx, group, author, content, now)
        })?;

        debug!(post_id = %post.id, "post created");
        Ok(post)
    }

    /// Posts of a group, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::GroupNotFound`] if the group doesn't exist.
    pub fn list_posts(&self, group: GroupId) -> Result<Vec<Post>> {
        self.db.read(|conn| {
            Self::require_group(conn, group)?;
            storage::posts_of(conn, group)
        })
    }

    /// Deletes a post. Allowed for its author and for group admins.
    ///
    /// # Errors
    ///
    /// - [`SocialError::PostNotFound`] if the post doesn't exist
    /// - [`SocialError::Forbidden`] for anyone else
    #[instrument(skip(self))]
    pub fn delete_post(&self, actor: UserId, post: PostId) -> Result<()> {
        self.db.transaction(|tx| {
            let existing = storage::get_post(tx, post)?.ok_or(SocialError::PostNotFound(post))?;
            if existing.author_id != actor {
                let group = Self::require_group(tx, existing.group_id)?;
                if !group.is_admin(actor) {
                    return Err(SocialError::Forbidden(format!(
                        "User {actor} may not delete post {post}"
                    )));
                }
            }
            storage::delete_post(tx, post)
        })?;

        debug!("post deleted");
        Ok(())
    }
}
