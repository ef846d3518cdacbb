// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Session-layer error taxonomy.
//!
//! Only `login()` and the raw HTTP surface return these to callers. The
//! degrade-to-logged-out flows (`restore_token`, `sync_user_info`,
//! `enforce_validity`, `logout`) convert every failure into a state
//! outcome instead, so UI code branches on booleans, never on errors.

use crate::storage::StorageError;

/// Errors surfaced by the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backend rejected the credentials (4xx on login).
    #[error("login rejected: {0}")]
    Credentials(String),

    /// The login call succeeded but the response carried no access token.
    /// A response contract violation, treated as a hard error.
    #[error("login response did not include an access token")]
    MissingAccessToken,

    /// Network-level failure (DNS, connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a status the client cannot act on.
    #[error("unexpected response from {endpoint}: HTTP {status}")]
    UnexpectedStatus {
        /// Endpoint path that produced the response.
        endpoint: String,
        /// Status code returned.
        status: u16,
    },

    /// Durable preference storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A request body could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An API path could not be resolved against the configured base URL.
    #[error("invalid endpoint {path}: {source}")]
    InvalidEndpoint {
        /// Path that failed to resolve.
        path: String,
        /// Underlying URL error.
        source: url::ParseError,
    },
}

impl SessionError {
    /// True when this error means the session itself is no longer valid
    /// (as opposed to a transient transport problem the caller may retry).
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SessionError::Credentials(_) | SessionError::MissingAccessToken
        ) || matches!(
            self,
            SessionError::UnexpectedStatus { status, .. } if *status == 401 || *status == 403
        )
    }
}
