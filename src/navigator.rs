// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Navigation seam for hard redirects.
//!
//! A silent logout on a protected page ends with a full-page navigation
//! to the login page. That navigation is also the de facto cancellation
//! mechanism: the navigating context abandons its in-flight work. The
//! embedding shell supplies the real implementation; the session layer
//! only talks to this trait.

use std::sync::Mutex;

/// Host-navigation interface injected into the session layer.
pub trait Navigator: Send + Sync {
    /// Path the user is currently on.
    fn current_path(&self) -> String;

    /// Perform a hard redirect to the given path.
    fn redirect(&self, path: &str);
}

/// Navigator for headless use: reports the root path and ignores
/// redirects.
#[derive(Debug, Default)]
pub struct NullNavigator;

impl Navigator for NullNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn redirect(&self, _path: &str) {}
}

/// Navigator that records redirects instead of performing them.
/// Intended for tests and for shells that drive navigation themselves.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    current: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create a recorder positioned at the given path.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(path.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Paths redirected to, in order.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().expect("navigator lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().expect("navigator lock").clone()
    }

    fn redirect(&self, path: &str) {
        let mut current = self.current.lock().expect("navigator lock");
        *current = path.to_string();
        self.redirects
            .lock()
            .expect("navigator lock")
            .push(path.to_string());
    }
}
