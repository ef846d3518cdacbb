// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! # Route Guards
//!
//! Page-level gatekeepers. A guard consults session state before a page
//! renders and answers with a [`GuardDecision`]: render, or redirect to
//! login, onboarding, or home. Guards do not navigate themselves — the
//! shell owns navigation; the one exception is the hard redirect inside
//! silent logout, which the session layer performs directly.
//!
//! Already-authenticated pages take the fast path: no restore, no
//! network.

use tracing::debug;

use crate::session::SessionManager;
use crate::token;

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the page.
    Allow,
    /// No valid session: land on the login page.
    RedirectToLogin,
    /// Session is valid but onboarding is unfinished.
    RedirectToOnboarding,
    /// A guest-only page was hit with a live session.
    RedirectToHome,
}

/// Page-level gatekeeper over the session manager.
#[derive(Clone)]
pub struct PageGuard {
    session: SessionManager,
}

impl PageGuard {
    /// Create a guard over the given session manager.
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// Gate a protected page.
    ///
    /// A valid in-memory session admits immediately with zero network
    /// calls. Otherwise a restore (silent refresh) runs; its failure
    /// redirects to login. An unfinished onboarding redirects to the
    /// onboarding page instead of rendering.
    pub async fn check_protected(&self) -> GuardDecision {
        if self.session.is_authenticated().await {
            if let Some(held) = self.session.access_token().await {
                if !token::is_expired(&held) {
                    return self.allow_or_onboarding().await;
                }
            }
        }

        match self.session.restore_token().await {
            Some(_) => self.allow_or_onboarding().await,
            None => {
                debug!("protected page without a session, redirecting to login");
                GuardDecision::RedirectToLogin
            }
        }
    }

    /// Gate a guest-only page (login, signup).
    ///
    /// Runs a restore first so a returning user whose only credential
    /// is the refresh cookie is recognized and sent home instead of
    /// being shown the login form again.
    pub async fn check_guest_only(&self) -> GuardDecision {
        match self.session.restore_token().await {
            Some(_) => GuardDecision::RedirectToHome,
            None => GuardDecision::Allow,
        }
    }

    /// Gate the onboarding page: requires a session, and bounces users
    /// who already completed onboarding back home.
    pub async fn check_onboarding(&self) -> GuardDecision {
        if self.session.restore_token().await.is_none() {
            return GuardDecision::RedirectToLogin;
        }
        if self.session.user().await.onboarding_completed {
            GuardDecision::RedirectToHome
        } else {
            GuardDecision::Allow
        }
    }

    async fn allow_or_onboarding(&self) -> GuardDecision {
        if self.session.user().await.onboarding_completed {
            GuardDecision::Allow
        } else {
            GuardDecision::RedirectToOnboarding
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::navigator::RecordingNavigator;
    use crate::testutil::{fresh_jwt, MockBackend, RefreshBehavior};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn guard_at(backend: &MockBackend, dir: &TempDir) -> (PageGuard, SessionManager) {
        let config = ClientConfig::default()
            .with_base_url(backend.base_url())
            .with_data_dir(dir.path());
        let session = SessionManager::new(config)
            .expect("manager")
            .with_navigator(Arc::new(RecordingNavigator::at("/moims")));
        (PageGuard::new(session.clone()), session)
    }

    #[tokio::test]
    async fn protected_page_admits_live_session_without_network() {
        let backend = MockBackend::spawn().await;
        let dir = TempDir::new().unwrap();
        let (guard, session) = guard_at(&backend, &dir).await;
        session.login("a@b.com", "pw").await.unwrap();

        assert_eq!(guard.check_protected().await, GuardDecision::Allow);
        assert_eq!(backend.state.refresh_hits(), 0);
    }

    #[tokio::test]
    async fn protected_page_restores_cold_session() {
        let backend = MockBackend::spawn().await;
        backend
            .state
            .set_refresh(RefreshBehavior::Token(fresh_jwt("u1")));
        let dir = TempDir::new().unwrap();
        let (guard, session) = guard_at(&backend, &dir).await;

        assert_eq!(guard.check_protected().await, GuardDecision::Allow);
        assert_eq!(backend.state.refresh_hits(), 1);
        assert!(session.is_authenticated().await);
        assert!(!session.is_auth_initializing().await);
    }

    #[tokio::test]
    async fn protected_page_redirects_to_login_when_restore_fails() {
        let backend = MockBackend::spawn().await;
        let dir = TempDir::new().unwrap();
        let (guard, session) = guard_at(&backend, &dir).await;

        assert_eq!(guard.check_protected().await, GuardDecision::RedirectToLogin);
        assert!(!session.is_authenticated().await);
        assert!(!session.is_auth_initializing().await);
    }

    #[tokio::test]
    async fn protected_page_redirects_unfinished_onboarding() {
        let backend = MockBackend::spawn().await;
        backend.state.login_onboarded.store(false, Ordering::SeqCst);
        let dir = TempDir::new().unwrap();
        let (guard, session) = guard_at(&backend, &dir).await;
        session.login("a@b.com", "pw").await.unwrap();

        assert_eq!(
            guard.check_protected().await,
            GuardDecision::RedirectToOnboarding
        );
    }

    #[tokio::test]
    async fn guest_page_redirects_home_when_cookie_restores_session() {
        let backend = MockBackend::spawn().await;
        backend
            .state
            .set_refresh(RefreshBehavior::Token(fresh_jwt("u1")));
        let dir = TempDir::new().unwrap();
        let (guard, _session) = guard_at(&backend, &dir).await;

        assert_eq!(guard.check_guest_only().await, GuardDecision::RedirectToHome);
    }

    #[tokio::test]
    async fn guest_page_allows_without_session() {
        let backend = MockBackend::spawn().await;
        let dir = TempDir::new().unwrap();
        let (guard, _session) = guard_at(&backend, &dir).await;

        assert_eq!(guard.check_guest_only().await, GuardDecision::Allow);
    }

    #[tokio::test]
    async fn onboarding_page_requires_session() {
        let backend = MockBackend::spawn().await;
        let dir = TempDir::new().unwrap();
        let (guard, _session) = guard_at(&backend, &dir).await;

        assert_eq!(guard.check_onboarding().await, GuardDecision::RedirectToLogin);
    }

    #[tokio::test]
    async fn onboarding_page_bounces_completed_users_home() {
        let backend = MockBackend::spawn().await;
        let dir = TempDir::new().unwrap();
        let (guard, session) = guard_at(&backend, &dir).await;
        session.login("a@b.com", "pw").await.unwrap();

        assert_eq!(guard.check_onboarding().await, GuardDecision::RedirectToHome);
    }

    #[tokio::test]
    async fn onboarding_page_admits_unfinished_users() {
        let backend = MockBackend::spawn().await;
        backend.state.login_onboarded.store(false, Ordering::SeqCst);
        let dir = TempDir::new().unwrap();
        let (guard, session) = guard_at(&backend, &dir).await;
        session.login("a@b.com", "pw").await.unwrap();

        assert_eq!(guard.check_onboarding().await, GuardDecision::Allow);
    }
}
