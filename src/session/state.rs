// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! In-memory session state and its phase machine.

use crate::models::UserProfile;

/// Lifecycle phase of the session.
///
/// ```text
/// LoggedOut --login/restore success--> Authenticated
/// LoggedOut --restore failure-------> LoggedOut
/// Authenticated --expiry detected---> TokenExpired --silent logout--> LoggedOut
/// Authenticated --logout------------> LoggedOut
/// any --restore call----------------> Initializing --> {Authenticated, LoggedOut}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No live session.
    LoggedOut,
    /// A restore attempt is in flight.
    Initializing,
    /// A valid access token is held in memory.
    Authenticated,
    /// The held token was detected expired; teardown pending.
    TokenExpired,
}

/// The mutable session state owned by the [`super::SessionManager`].
///
/// `access_token` lives only here, in process memory. It is never
/// serialized; the persistence allowlist
/// ([`crate::storage::PersistedState`]) has no field for it.
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    /// Bearer credential for API calls. Memory-only.
    pub access_token: Option<String>,
    /// Current user identity (persisted across reloads).
    pub user: UserProfile,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// True while a restore attempt is in flight; guards block
    /// dependent renders on this.
    pub is_auth_initializing: bool,
    /// Dark-mode preference (persisted across reloads).
    pub is_dark_mode: bool,
}

impl SessionState {
    /// Boot-time state: logged out, with identity and preferences
    /// rehydrated from durable storage.
    pub fn at_boot(user: UserProfile, is_dark_mode: bool) -> Self {
        Self {
            access_token: None,
            user,
            phase: SessionPhase::LoggedOut,
            is_auth_initializing: false,
            is_dark_mode,
        }
    }

    /// Whether the session is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    /// Commit a live token: the only transition into `Authenticated`.
    pub fn commit_token(&mut self, token: String) {
        self.access_token = Some(token);
        self.phase = SessionPhase::Authenticated;
    }

    /// Drop the token and return to `LoggedOut`, resetting the user to
    /// defaults.
    pub fn tear_down(&mut self) {
        self.access_token = None;
        self.user = UserProfile::default();
        self.phase = SessionPhase::LoggedOut;
    }
}
