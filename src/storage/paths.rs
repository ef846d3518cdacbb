// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! File layout for durable client state.

use std::path::{Path, PathBuf};

/// Path utilities for the client data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// Create a new `StoragePaths` rooted at the given directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all durable client state.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The preference file: the `{isDarkMode, user}` allowlist.
    pub fn preferences(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    /// Marker file recording that a session previously existed.
    pub fn session_flag(&self) -> PathBuf {
        self.root.join("session.flag")
    }

    /// One-shot logout reason shown by the next login page render.
    pub fn logout_reason(&self) -> PathBuf {
        self.root.join("logout_reason")
    }
}
