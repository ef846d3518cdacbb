// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! # Session Module
//!
//! Single source of truth for authentication state.
//!
//! ## Session Flow
//!
//! 1. The app constructs one [`SessionManager`] at startup and hands it
//!    (by clone — the innards are shared) to the HTTP client and guards
//! 2. A guard on a protected page calls `restore_token()`:
//!    - a valid in-memory token is returned immediately (no network)
//!    - otherwise a silent refresh rides the HTTP-only cookie
//!    - failure degrades to logged-out, never to an error
//! 3. Token expiry detected anywhere resolves through
//!    `logout_silently`, which breaks refresh-retry cycles: it performs
//!    no authenticated request of its own
//!
//! ## Persistence
//!
//! Only `{isDarkMode, user}` and the advisory session flag survive a
//! reload. The access token never leaves process memory.

mod manager;
mod state;

pub use manager::{LoginOutcome, SessionManager, SESSION_EXPIRED_REASON};
pub use state::SessionPhase;

pub(crate) use state::SessionState;
