//! User identities.
//!
//! The [`UserDirectory`] registers users and resolves identifiers to
//! [`User`] records. The relationship and group workflows only need to know
//! whether a user exists; profile fields are carried for display.

mod directory;
pub(crate) mod storage;
mod types;

pub use directory::UserDirectory;
pub use types::{User, UserId};
