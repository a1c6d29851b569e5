//! Entry point tying the database, notifier and workflows together.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use crate::config::EngineConfig;
use crate::db::Database;
use crate::error::{Result, SocialError};
use crate::graph::RelationshipGraph;
use crate::group::GroupMembershipWorkflow;
use crate::identity::UserDirectory;
use crate::notify::{ChannelNotifier, Notification, Notifier};

/// Core interface for the social graph.
///
/// Built once from an [`EngineConfig`]; every workflow shares the same
/// database handle and notifier.
///
/// # Examples
///
/// ```no_run
/// use social_core::{EngineConfig, SocialCore};
///
/// let (core, _events) = SocialCore::open(EngineConfig::new("/tmp/social"))?;
/// let alice = core.users().create_user("alice", None, None)?;
/// let bob = core.users().create_user("bob", None, None)?;
/// core.relationships().send_request(alice.id, bob.id)?;
/// # Ok::<(), social_core::SocialError>(())
/// ```
pub struct SocialCore {
    config: EngineConfig,
    users: UserDirectory,
    relationships: RelationshipGraph,
    groups: GroupMembershipWorkflow,
}

impl std::fmt::Debug for SocialCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialCore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SocialCore {
    /// Opens the database described by `config` with a channel notifier.
    ///
    /// The returned receiver yields every notification; hand it to
    /// [`spawn_dispatcher`](crate::notify::spawn_dispatcher) or drain it
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub fn open(config: EngineConfig) -> Result<(Self, mpsc::Receiver<Notification>)> {
        let (notifier, receiver) = ChannelNotifier::new(config.notification_buffer.max(1));
        let core = Self::with_notifier(config, Arc::new(notifier))?;
        Ok((core, receiver))
    }

    /// Opens the database described by `config` with a caller-supplied
    /// notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the data directory
    /// cannot be created, or the database cannot be opened.
    #[instrument(skip(config, notifier), fields(data_dir = %config.data_dir.display()))]
    pub fn with_notifier(config: EngineConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let db = Self::open_database(&config).inspect_err(|e| {
            error!(error = %e, "failed to open social core");
        })?;
        info!("social core opened");
        Ok(Self::assemble(config, Arc::new(db), notifier))
    }

    fn open_database(config: &EngineConfig) -> Result<Database> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            SocialError::Storage(format!(
                "Failed to create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;
        Database::open(&config.database_path())
    }

    /// Creates an instance backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn open_in_memory(config: EngineConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::assemble(config, Arc::new(db), notifier))
    }

    fn assemble(config: EngineConfig, db: Arc<Database>, notifier: Arc<dyn Notifier>) -> Self {
        let users = UserDirectory::new(Arc::clone(&db), config.limits);
        let relationships =
            RelationshipGraph::new(Arc::clone(&db), Arc::clone(&notifier), config.suggestion_limit);
        let groups = GroupMembershipWorkflow::new(db, notifier, config.limits);
        Self {
            config,
            users,
            relationships,
            groups,
        }
    }

    /// The configuration this instance was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// User registration and lookup.
    #[must_use]
    pub const fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Friend requests, friendships and suggestions.
    #[must_use]
    pub const fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    /// Groups, memberships and posts.
    #[must_use]
    pub const fn groups(&self) -> &GroupMembershipWorkflow {
        &self.groups
    }
}
