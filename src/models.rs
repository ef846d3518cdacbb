// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! User profile and wire types for the auth endpoints.

use serde::{Deserialize, Serialize};

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Normal member.
    #[default]
    User,
    /// Platform administrator.
    Admin,
}

/// The locally held user identity.
///
/// Created with safe defaults before any login (`role = user`,
/// `onboarding_completed = true` for backward compatibility with
/// accounts that predate onboarding). Overwritten wholesale on login
/// and selectively merged on profile sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Legal/display name.
    pub name: String,
    /// Public nickname shown on moim pages.
    pub nickname: String,
    /// Platform role.
    pub role: Role,
    /// Whether the user has finished onboarding.
    pub onboarding_completed: bool,
    /// Profile image URL, if set.
    pub profile_image: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            email: String::new(),
            name: String::new(),
            nickname: String::new(),
            role: Role::User,
            onboarding_completed: true,
            profile_image: None,
        }
    }
}

impl UserProfile {
    /// Merge a fetched profile into this one, preserving previously
    /// known fields wherever the backend omitted them. An absent
    /// `onboardingCompleted` keeps the prior value rather than
    /// resetting to a default.
    pub fn merge(&mut self, fetched: ProfileResponse) {
        if let Some(id) = fetched.id {
            self.id = id;
        }
        if let Some(email) = fetched.email {
            self.email = email;
        }
        if let Some(name) = fetched.name {
            self.name = name;
        }
        if let Some(nickname) = fetched.nickname {
            self.nickname = nickname;
        }
        if let Some(role) = fetched.role {
            self.role = role;
        }
        if let Some(done) = fetched.onboarding_completed {
            self.onboarding_completed = done;
        }
        if let Some(image) = fetched.profile_image {
            self.profile_image = Some(image);
        }
    }
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password (TLS-protected in transit).
    pub password: String,
}

/// Nested user object in the login response.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    /// Platform role.
    #[serde(default)]
    pub role: Role,
}

/// Response body for `POST /auth/login`.
///
/// `access_token` is optional on the wire: a 2xx with no token is a
/// contract violation that the session layer turns into a hard error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Freshly minted access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Backend user identifier.
    pub user_id: String,
    /// Login email.
    pub email: String,
    /// Legal/display name.
    #[serde(default)]
    pub name: String,
    /// Public nickname.
    #[serde(default)]
    pub nickname: String,
    /// Whether onboarding has been completed.
    #[serde(default)]
    pub onboarding_completed: Option<bool>,
    /// Nested user object carrying the role.
    #[serde(default)]
    pub user: LoginUser,
}

impl LoginResponse {
    /// Build the local profile this response describes.
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            role: self.user.role,
            // Absent means a pre-onboarding account; treat as completed.
            onboarding_completed: self.onboarding_completed.unwrap_or(true),
            profile_image: None,
        }
    }
}

/// Response body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// New access token; absent means the refresh was rejected.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Response body for `GET /auth/me`.
///
/// Every field is optional so that a partial backend payload merges
/// into the existing profile instead of clobbering it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Backend user identifier.
    pub id: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// Legal/display name.
    pub name: Option<String>,
    /// Public nickname.
    pub nickname: Option<String>,
    /// Platform role.
    pub role: Option<Role>,
    /// Whether onboarding has been completed.
    pub onboarding_completed: Option<bool>,
    /// Profile image URL.
    pub profile_image: Option<String>,
}
