// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Preference file, session flag, and logout reason.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{StoragePaths, StorageError, StorageResult};
use crate::models::UserProfile;

/// The serialization allowlist: the only shape that is ever written to
/// the preference file. `access_token` and the authenticated bit have
/// no field here, so they cannot leak into durable storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Dark-mode preference.
    pub is_dark_mode: bool,
    /// Last known user identity. Identity persists; authentication
    /// does not.
    pub user: UserProfile,
}

/// File-backed store for durable, non-sensitive client state.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    paths: StoragePaths,
}

impl PreferenceStore {
    /// Open (and create if needed) the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let paths = StoragePaths::new(root);
        fs::create_dir_all(paths.root())?;
        Ok(Self { paths })
    }

    /// Load the persisted state, or defaults when the file is absent.
    ///
    /// A corrupt preference file degrades to defaults rather than
    /// erroring: losing a dark-mode flag is cheaper than blocking app
    /// start.
    pub fn load(&self) -> PersistedState {
        match self.read_json::<PersistedState>(&self.paths.preferences()) {
            Ok(state) => state,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                PersistedState::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "preference file unreadable, using defaults");
                PersistedState::default()
            }
        }
    }

    /// Persist the allowlisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, state: &PersistedState) -> StorageResult<()> {
        self.write_json(&self.paths.preferences(), state)
    }

    /// Record that a session exists (written on login/refresh success).
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be written.
    pub fn set_session_flag(&self) -> StorageResult<()> {
        fs::write(self.paths.session_flag(), b"1")?;
        Ok(())
    }

    /// Clear the session marker (logout or refresh failure). Missing
    /// marker is not an error.
    pub fn clear_session_flag(&self) {
        let _ = fs::remove_file(self.paths.session_flag());
    }

    /// Whether a session previously existed. Advisory only: actual
    /// authentication is always re-validated against the backend.
    pub fn has_session_flag(&self) -> bool {
        File::open(self.paths.session_flag()).is_ok()
    }

    /// Stash a human-readable reason for the next login page render.
    ///
    /// # Errors
    ///
    /// Returns an error if the stash cannot be written.
    pub fn stash_logout_reason(&self, reason: &str) -> StorageResult<()> {
        fs::write(self.paths.logout_reason(), reason.as_bytes())?;
        Ok(())
    }

    /// Read the stashed logout reason, deleting it. One-shot: a second
    /// call returns `None`.
    pub fn take_logout_reason(&self) -> Option<String> {
        let path = self.paths.logout_reason();
        let reason = fs::read_to_string(&path).ok()?;
        let _ = fs::remove_file(&path);
        Some(reason)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, path: &Path) -> StorageResult<T> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Write JSON atomically via temp-file rename.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
