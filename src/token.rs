// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Access-token payload inspection.
//!
//! The client holds no verification key: signature checking is the
//! backend's job. All the session layer needs from the token is the
//! expiry claim, so decoding deliberately skips signature verification.
//! Any decoding failure is treated the same as expiry — the token is
//! unusable either way.
//!
//! This module is pure. Enforcement (silent logout on an invalid token)
//! lives in [`crate::session::SessionManager::enforce_validity`].

use chrono::Utc;
use serde::Deserialize;

/// Clock skew tolerance when comparing the expiry claim (30 seconds).
/// Access tokens are short-lived, so the leeway stays small.
pub const CLOCK_SKEW_LEEWAY_SECS: i64 = 30;

/// Claims the session layer reads from an access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID).
    #[serde(default)]
    pub sub: String,
    /// Expiration timestamp (Unix seconds).
    #[serde(default)]
    pub exp: i64,
    /// Issued-at timestamp.
    #[serde(default)]
    pub iat: i64,
}

/// Token decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token is not a structurally valid JWT.
    #[error("token is malformed")]
    Malformed,
}

/// Decode the claims of an access token without verifying its signature.
///
/// # Errors
///
/// Returns [`TokenError::Malformed`] when the token is not a decodable JWT.
pub fn decode(token: &str) -> Result<AccessClaims, TokenError> {
    let data = jsonwebtoken::dangerous::insecure_decode::<AccessClaims>(token)
        .map_err(|_| TokenError::Malformed)?;
    Ok(data.claims)
}

/// Whether a token is expired (or undecodable, which counts as expired).
///
/// A missing or zero `exp` claim is treated as expired: the backend
/// always stamps one, so its absence means the token is not ours.
pub fn is_expired(token: &str) -> bool {
    match decode(token) {
        Ok(claims) => {
            let now = Utc::now().timestamp();
            claims.exp <= 0 || claims.exp < now - CLOCK_SKEW_LEEWAY_SECS
        }
        Err(_) => true,
    }
}
