//! Engine configuration.
//!
//! [`EngineConfig`] is built either in code with the `with_*` methods or
//! loaded from a JSON file. Missing fields fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SocialError};

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "social.db";

/// Maximum lengths (in characters) for user-supplied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLimits {
    /// Maximum username length.
    pub max_username_len: usize,
    /// Maximum display name length.
    pub max_display_name_len: usize,
    /// Maximum bio length.
    pub max_bio_len: usize,
    /// Maximum group name length.
    pub max_group_name_len: usize,
    /// Maximum group description length.
    pub max_description_len: usize,
    /// Maximum post content length.
    pub max_post_len: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_username_len: 32,
            max_display_name_len: 64,
            max_bio_len: 500,
            max_group_name_len: 100,
            max_description_len: 1000,
            max_post_len: 5000,
        }
    }
}

/// Configuration for a [`SocialCore`](crate::SocialCore) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the database file.
    pub data_dir: PathBuf,
    /// Database file name, relative to `data_dir`.
    pub database_file: String,
    /// Text length limits.
    pub limits: ContentLimits,
    /// Maximum number of friend suggestions returned.
    pub suggestion_limit: usize,
    /// Capacity of the notification channel.
    pub notification_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            limits: ContentLimits::default(),
            suggestion_limit: 20,
            notification_buffer: 256,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration rooted at `data_dir` with default settings.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the database file name.
    #[must_use]
    pub fn with_database_file(mut self, file: impl Into<String>) -> Self {
        self.database_file = file.into();
        self
    }

    /// Sets the content limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the maximum number of friend suggestions.
    #[must_use]
    pub const fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// Sets the notification channel capacity.
    #[must_use]
    pub const fn with_notification_buffer(mut self, capacity: usize) -> Self {
        self.notification_buffer = capacity;
        self
    }

    /// Full path to the database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SocialError::Config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SocialError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the database file name is empty, the suggestion
    /// limit is zero, or the notification buffer has zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            return Err(SocialError::Config(
                "database_file must not be empty".to_string(),
            ));
        }
        if self.suggestion_limit == 0 {
            return Err(SocialError::Config(
                "suggestion_limit must be greater than zero".to_string(),
            ));
        }
        if self.notification_buffer == 0 {
            return Err(SocialError::Config(
                "notification_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
