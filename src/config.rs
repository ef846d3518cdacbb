// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! # Runtime Configuration
//!
//! Client configuration for the session layer. Loaded from the
//! environment at startup, with builder-style overrides for embedding
//! and tests.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MOIM_API_BASE_URL` | Backend base URL for auth endpoints | `http://localhost:8080` |
//! | `MOIM_DATA_DIR` | Directory for durable client preferences | `./.moim` |
//! | `MOIM_HTTP_TIMEOUT_SECS` | Per-request timeout in seconds | `15` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// Environment variable name for the backend base URL.
pub const API_BASE_URL_ENV: &str = "MOIM_API_BASE_URL";

/// Environment variable name for the durable data directory.
pub const DATA_DIR_ENV: &str = "MOIM_DATA_DIR";

/// Environment variable name for the per-request timeout (seconds).
pub const HTTP_TIMEOUT_ENV: &str = "MOIM_HTTP_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_DATA_DIR: &str = "./.moim";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Paths that never carry a bearer token and never trigger the
/// 401-recovery path. The login page itself is public so that a silent
/// logout landing there cannot loop.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/auth/login",
    "/auth/refresh",
    "/auth/signup",
    "/login",
    "/signup",
    "/",
];

/// Client configuration for the session layer.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    data_dir: PathBuf,
    public_paths: Vec<String>,
    request_timeout: Duration,
    login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_string()).collect(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_path: "/login".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `MOIM_API_BASE_URL` is set but not a valid URL.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var(API_BASE_URL_ENV) {
            config.base_url = Url::parse(&base)?;
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var(HTTP_TIMEOUT_ENV) {
            if let Ok(secs) = secs.parse::<u64>() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }

    /// Override the backend base URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the durable data directory (useful for testing).
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Replace the public-path allowlist.
    pub fn with_public_paths(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.public_paths = paths.into_iter().collect();
        self
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Durable data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Path of the login page, the silent-logout redirect target.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Resolve an API path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined to the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    /// Whether a path is on the public allowlist (no bearer token, no
    /// 401 recovery, no silent-logout redirect).
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| {
            if public == "/" {
                path == "/"
            } else {
                path == public || path.starts_with(&format!("{public}/"))
            }
        })
    }
}
