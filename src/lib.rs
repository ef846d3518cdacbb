// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Moim Session - Client-Side Authentication Session Lifecycle
//!
//! Session core of the Moim web client: in-memory access-token
//! management, transparent token refresh on 401/403, session
//! restoration at app start, and silent-logout semantics that avoid
//! redirect loops and duplicate refresh calls.
//!
//! ## Modules
//!
//! - `session` - The session manager (all auth state transitions)
//! - `http` - Authenticated API client with one-shot 401 recovery
//! - `guard` - Page-level gatekeepers and redirect decisions
//! - `token` - Access-token payload inspection (expiry)
//! - `storage` - Durable non-sensitive client state
//! - `navigator` - Hard-redirect seam supplied by the host shell
//!
//! ## Typical wiring
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let session = SessionManager::new(config)?.with_navigator(shell_nav);
//! let api = ApiClient::new(session.clone());
//! let guard = PageGuard::new(session.clone());
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod models;
pub mod navigator;
pub mod session;
pub mod storage;
pub mod token;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::ClientConfig;
pub use error::SessionError;
pub use guard::{GuardDecision, PageGuard};
pub use http::ApiClient;
pub use models::{Role, UserProfile};
pub use navigator::Navigator;
pub use session::{LoginOutcome, SessionManager, SessionPhase};
