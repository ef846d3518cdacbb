// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! The session manager: owns all auth state transitions.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::StatusCode;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{SessionPhase, SessionState};
use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::models::{LoginRequest, LoginResponse, ProfileResponse, RefreshResponse, UserProfile};
use crate::navigator::{Navigator, NullNavigator};
use crate::storage::{PersistedState, PreferenceStore};
use crate::token;

/// Reason stashed for the login page when a session dies under the
/// user's feet.
pub const SESSION_EXPIRED_REASON: &str = "Your session has expired. Please sign in again.";

/// Outcome of a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The account has not finished onboarding; the caller should land
    /// on the onboarding page instead of home.
    pub should_redirect_to_onboarding: bool,
}

/// Single source of truth for authentication state.
///
/// Constructed once at application start and passed by reference (it is
/// cheap to clone; all innards are shared). No hidden global: every
/// consumer receives its instance explicitly.
#[derive(Clone)]
pub struct SessionManager {
    config: ClientConfig,
    http: reqwest::Client,
    cookies: Arc<Jar>,
    prefs: PreferenceStore,
    navigator: Arc<dyn Navigator>,
    state: Arc<RwLock<SessionState>>,
    /// Single-flight guard: at most one refresh call in flight across
    /// `restore_token` and the HTTP client's 401 recovery.
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl SessionManager {
    /// Create a manager, rehydrating identity and preferences from the
    /// configured data directory. The session starts logged out; call
    /// [`SessionManager::restore_token`] to attempt silent renewal.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be opened or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, SessionError> {
        let prefs = PreferenceStore::open(config.data_dir())?;
        let persisted = prefs.load();

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .cookie_provider(cookies.clone())
            .build()?;

        Ok(Self {
            config,
            http,
            cookies,
            prefs,
            navigator: Arc::new(NullNavigator),
            state: Arc::new(RwLock::new(SessionState::at_boot(
                persisted.user,
                persisted.is_dark_mode,
            ))),
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Inject the host navigator used for hard redirects.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared HTTP client. The cookie jar rides along, so the
    /// refresh cookie set at login is visible to every consumer.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ========== Accessors ==========

    /// Current in-memory access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    /// Current user identity.
    pub async fn user(&self) -> UserProfile {
        self.state.read().await.user.clone()
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// Whether the session is authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Whether a restore attempt is in flight.
    pub async fn is_auth_initializing(&self) -> bool {
        self.state.read().await.is_auth_initializing
    }

    /// Dark-mode preference.
    pub async fn is_dark_mode(&self) -> bool {
        self.state.read().await.is_dark_mode
    }

    /// Set and persist the dark-mode preference.
    pub async fn set_dark_mode(&self, enabled: bool) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.is_dark_mode = enabled;
            PersistedState {
                is_dark_mode: enabled,
                user: state.user.clone(),
            }
        };
        if let Err(e) = self.prefs.save(&snapshot) {
            warn!(error = %e, "failed to persist dark-mode preference");
        }
    }

    /// Read-and-delete the stashed logout reason. One-shot, consumed by
    /// the login page render.
    pub fn take_logout_reason(&self) -> Option<String> {
        self.prefs.take_logout_reason()
    }

    // ========== Transitions ==========

    /// Log in with email and password.
    ///
    /// On success the access token is held in memory, the user profile
    /// is populated from the response, and the durable session flag is
    /// set. A 2xx response without a token is a contract violation and
    /// surfaces as [`SessionError::MissingAccessToken`] with no state
    /// mutation.
    ///
    /// # Errors
    ///
    /// [`SessionError::Credentials`] on rejection,
    /// [`SessionError::Transport`] on network failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, SessionError> {
        let url = self
            .config
            .endpoint("/auth/login")
            .map_err(|source| SessionError::InvalidEndpoint {
                path: "/auth/login".to_string(),
                source,
            })?;

        let response = self
            .http
            .post(url)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error")?.as_str().map(str::to_string))
                .unwrap_or_else(|| "invalid email or password".to_string());
            return Err(SessionError::Credentials(message));
        }
        if !status.is_success() {
            return Err(SessionError::UnexpectedStatus {
                endpoint: "/auth/login".to_string(),
                status: status.as_u16(),
            });
        }

        let body: LoginResponse = response.json().await?;
        let Some(access_token) = body.access_token.clone() else {
            // Hard error even though the HTTP call succeeded. Session
            // state is untouched.
            return Err(SessionError::MissingAccessToken);
        };

        let profile = body.to_profile();
        let should_redirect_to_onboarding = !profile.onboarding_completed;

        let snapshot = {
            let mut state = self.state.write().await;
            state.user = profile;
            state.commit_token(access_token);
            PersistedState {
                is_dark_mode: state.is_dark_mode,
                user: state.user.clone(),
            }
        };
        if let Err(e) = self.prefs.save(&snapshot) {
            warn!(error = %e, "failed to persist user after login");
        }
        if let Err(e) = self.prefs.set_session_flag() {
            warn!(error = %e, "failed to set session flag");
        }

        info!(user_id = %snapshot.user.id, "login succeeded");
        Ok(LoginOutcome {
            should_redirect_to_onboarding,
        })
    }

    /// Restore the session, renewing the token silently if needed.
    ///
    /// Idempotent and safe to call on every protected-page mount. The
    /// fast path — a valid in-memory token — performs zero network
    /// calls. Failures never surface as errors: the session degrades to
    /// logged-out and `None` is returned. `is_auth_initializing` is
    /// cleared on every exit path, so guards cannot hang on it.
    pub async fn restore_token(&self) -> Option<String> {
        {
            let mut state = self.state.write().await;
            state.is_auth_initializing = true;
            state.phase = SessionPhase::Initializing;
        }

        let result = self.restore_token_inner().await;

        {
            let mut state = self.state.write().await;
            state.is_auth_initializing = false;
            // Initializing must not leak past this call.
            if state.phase == SessionPhase::Initializing {
                state.phase = if result.is_some() {
                    SessionPhase::Authenticated
                } else {
                    SessionPhase::LoggedOut
                };
            }
        }

        result
    }

    async fn restore_token_inner(&self) -> Option<String> {
        // Fast path: a valid in-memory token. Dominates in steady state.
        {
            let mut state = self.state.write().await;
            if let Some(existing) = state.access_token.clone() {
                if !token::is_expired(&existing) {
                    state.phase = SessionPhase::Authenticated;
                    return Some(existing);
                }
                debug!("in-memory token expired or corrupt, discarding");
                state.access_token = None;
                state.phase = SessionPhase::TokenExpired;
            }
        }

        // The flag is advisory: the HTTP-only cookie can outlive local
        // storage, so a refresh is attempted either way.
        if !self.prefs.has_session_flag() {
            debug!("no session flag; trying cookie refresh anyway");
        }

        match self.refresh_access_token(None).await {
            Some(fresh) => Some(fresh),
            None => {
                {
                    let mut state = self.state.write().await;
                    state.access_token = None;
                    state.phase = SessionPhase::LoggedOut;
                }
                self.prefs.clear_session_flag();
                debug!("silent restore failed, session is logged out");
                None
            }
        }
    }

    /// Refresh the access token against `/auth/refresh`.
    ///
    /// Single-flight: concurrent callers (a restore racing the HTTP
    /// client's 401 recovery, or several 401s at once) collapse onto
    /// one network call. After acquiring the lock, a token committed by
    /// whoever held it before us is reused instead of refreshed again —
    /// unless it is the very token whose rejection brought us here
    /// (`failed_token`), which the backend has already vetoed.
    ///
    /// On success the token is committed and the session flag set. On
    /// failure nothing is torn down here; callers decide between
    /// logged-out bookkeeping (`restore_token`) and silent logout (the
    /// HTTP client).
    pub(crate) async fn refresh_access_token(&self, failed_token: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        {
            let state = self.state.read().await;
            if let Some(existing) = state.access_token.clone() {
                if !token::is_expired(&existing) && Some(existing.as_str()) != failed_token {
                    debug!("refresh collapsed onto token committed by concurrent flow");
                    return Some(existing);
                }
            }
        }

        let fresh = self.request_refresh().await?;
        {
            let mut state = self.state.write().await;
            state.commit_token(fresh.clone());
        }
        if let Err(e) = self.prefs.set_session_flag() {
            warn!(error = %e, "failed to set session flag after refresh");
        }
        info!("access token refreshed");
        Some(fresh)
    }

    /// One refresh network call. The refresh credential is the
    /// HTTP-only cookie in the shared jar; the client never reads it.
    async fn request_refresh(&self) -> Option<String> {
        let url = match self.config.endpoint("/auth/refresh") {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "refresh endpoint could not be resolved");
                return None;
            }
        };

        let response = match self.http.post(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "refresh transport failure");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "refresh rejected by backend");
            return None;
        }

        match response.json::<RefreshResponse>().await {
            Ok(RefreshResponse {
                access_token: Some(fresh),
            }) if !fresh.is_empty() => Some(fresh),
            Ok(_) => {
                warn!("refresh response carried no token");
                None
            }
            Err(e) => {
                warn!(error = %e, "refresh response unreadable");
                None
            }
        }
    }

    /// Fetch the profile from `/auth/me` and merge it into the local
    /// user, preserving fields the backend omitted.
    ///
    /// Requires an existing valid token; does not attempt a refresh. A
    /// fetch failure is treated as a signal the session is no longer
    /// valid server-side and de-authenticates the store.
    pub async fn sync_user_info(&self) -> bool {
        let Some(access_token) = self.access_token().await else {
            return false;
        };
        if token::is_expired(&access_token) {
            return false;
        }

        let fetched = self.request_profile(&access_token).await;
        match fetched {
            Some(profile) => {
                let snapshot = {
                    let mut state = self.state.write().await;
                    state.user.merge(profile);
                    PersistedState {
                        is_dark_mode: state.is_dark_mode,
                        user: state.user.clone(),
                    }
                };
                if let Err(e) = self.prefs.save(&snapshot) {
                    warn!(error = %e, "failed to persist synced profile");
                }
                true
            }
            None => {
                warn!("profile sync failed, de-authenticating");
                self.state.write().await.phase = SessionPhase::LoggedOut;
                false
            }
        }
    }

    async fn request_profile(&self, access_token: &str) -> Option<ProfileResponse> {
        let url = self.config.endpoint("/auth/me").ok()?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<ProfileResponse>().await.ok()
    }

    /// Check the held token and enforce expiry.
    ///
    /// Returns `true` when a valid token is held. An expired, corrupt,
    /// or absent token resolves through [`SessionManager::logout_silently`];
    /// repeated calls after that are no-ops (one redirect, not many).
    pub async fn enforce_validity(&self) -> bool {
        let held = self.access_token().await;
        match held {
            Some(existing) if !token::is_expired(&existing) => true,
            Some(_) => {
                self.state.write().await.phase = SessionPhase::TokenExpired;
                self.logout_silently(SESSION_EXPIRED_REASON).await;
                false
            }
            None => {
                self.logout_silently(SESSION_EXPIRED_REASON).await;
                false
            }
        }
    }

    /// The single gate used by route guards: enforce validity, redirect
    /// on failure.
    pub async fn check_auth_and_redirect(&self) -> bool {
        self.enforce_validity().await
    }

    /// Log out: invalidate the refresh cookie server-side, then tear
    /// down local state. Local teardown happens even when the backend
    /// call fails — logout must never leave the client believing it is
    /// authenticated.
    pub async fn logout(&self) {
        let held = self.access_token().await;
        match self.config.endpoint("/auth/logout") {
            Ok(url) => {
                let mut request = self.http.post(url);
                if let Some(access_token) = held {
                    request = request.bearer_auth(access_token);
                }
                if let Err(e) = request.send().await {
                    warn!(error = %e, "backend logout failed, clearing local session anyway");
                }
            }
            Err(e) => warn!(error = %e, "logout endpoint could not be resolved"),
        }

        self.tear_down_local().await;
        self.clear_refresh_cookie();
        info!("logged out");
    }

    /// Local-only session teardown: clear the memory token, reset the
    /// user, clear the session flag. No backend call — this is the path
    /// that breaks refresh-retry cycles, so it must never itself issue
    /// an authenticated request.
    ///
    /// When the user is on a protected page, the reason string is
    /// stashed for the next login page render and a hard redirect to
    /// login is performed. Idempotent: calling it while already logged
    /// out does nothing (and cannot redirect-loop).
    pub async fn logout_silently(&self, reason: &str) {
        {
            let state = self.state.read().await;
            if state.phase == SessionPhase::LoggedOut && state.access_token.is_none() {
                return;
            }
        }

        self.tear_down_local().await;

        let current = self.navigator.current_path();
        if self.config.is_public_path(&current) {
            debug!(path = %current, "silent logout on public path, no redirect");
        } else {
            if let Err(e) = self.prefs.stash_logout_reason(reason) {
                warn!(error = %e, "failed to stash logout reason");
            }
            warn!(from = %current, "silent logout, redirecting to login");
            self.navigator.redirect(self.config.login_path());
        }
    }

    async fn tear_down_local(&self) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.tear_down();
            PersistedState {
                is_dark_mode: state.is_dark_mode,
                user: state.user.clone(),
            }
        };
        self.prefs.clear_session_flag();
        if let Err(e) = self.prefs.save(&snapshot) {
            warn!(error = %e, "failed to persist state after teardown");
        }
    }

    /// Overwrite the refresh cookie with expired variants.
    ///
    /// Environments differ in how the cookie was scoped (host-only vs
    /// domain-qualified, root vs auth path), so every variant is
    /// written in sequence.
    fn clear_refresh_cookie(&self) {
        let base = self.config.base_url();
        let mut variants = vec![
            "refresh=; Max-Age=0; Path=/".to_string(),
            "refresh=; Max-Age=0; Path=/auth".to_string(),
        ];
        if let Some(host) = base.host_str() {
            variants.push(format!("refresh=; Max-Age=0; Path=/; Domain={host}"));
        }
        for variant in &variants {
            self.cookies.add_cookie_str(variant, base);
        }
    }
}
