// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Durable, non-sensitive client state.
//!
//! Three pieces of state survive a reload, and only three:
//!
//! - the preference file: `{isDarkMode, user}` — identity, not
//!   authentication
//! - the session flag: a marker that a session previously existed
//! - the logout reason: a one-shot string for the next login page render
//!
//! The access token and the authenticated bit are deliberately absent.
//! That exclusion is enforced by the [`PersistedState`] type itself: the
//! only struct that ever touches the preference file has no field to
//! put them in. Session validity is always re-derived from the backend.

mod paths;
mod prefs;

pub use paths::StoragePaths;
pub use prefs::{PersistedState, PreferenceStore};

/// Error type for durable storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
