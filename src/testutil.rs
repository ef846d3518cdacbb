// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Test support: a loopback mock of the auth backend.
//!
//! The mock serves the four auth endpoints plus one protected sample
//! endpoint, counts hits per endpoint, and can be scripted per test
//! (reject logins, rotate the refresh token, require the refresh
//! cookie, fail the profile fetch).

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use serde_json::json;
use url::Url;

/// Build an unsigned JWT with the given subject and expiry.
pub(crate) fn make_jwt(sub: &str, exp: i64) -> String {
    let header = r#"{"alg":"HS256","typ":"JWT"}"#;
    let claims = format!(r#"{{"sub":"{sub}","iat":1700000000,"exp":{exp}}}"#);
    let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims.as_bytes());
    format!("{header_b64}.{claims_b64}.sig")
}

/// A JWT that expires an hour from now.
pub(crate) fn fresh_jwt(sub: &str) -> String {
    make_jwt(sub, Utc::now().timestamp() + 3600)
}

/// A JWT that expired an hour ago.
pub(crate) fn stale_jwt(sub: &str) -> String {
    make_jwt(sub, Utc::now().timestamp() - 3600)
}

/// What `POST /auth/refresh` should do.
pub(crate) enum RefreshBehavior {
    /// Mint this token.
    Token(String),
    /// Reject with 401.
    Reject,
    /// Answer 200 with no token in the body (contract violation).
    EmptyBody,
}

/// Scriptable state shared with the mock handlers.
pub(crate) struct MockState {
    pub login_hits: AtomicUsize,
    pub refresh_hits: AtomicUsize,
    pub logout_hits: AtomicUsize,
    pub me_hits: AtomicUsize,
    pub protected_hits: AtomicUsize,

    /// Token returned by a successful login; `None` omits the field.
    pub login_token: Mutex<Option<String>>,
    /// Reject logins with 401.
    pub reject_login: AtomicBool,
    /// `onboardingCompleted` in the login response.
    pub login_onboarded: AtomicBool,
    /// Refresh behavior.
    pub refresh: Mutex<RefreshBehavior>,
    /// Whether the protected endpoint accepts tokens minted by refresh.
    /// Turn off to simulate refresh handing out already-dead tokens.
    pub accept_refreshed: AtomicBool,
    /// Require the `refresh=` cookie set by login.
    pub require_refresh_cookie: AtomicBool,
    /// Status the protected endpoint rejects with (401 or 403; the
    /// recovery path must treat both the same).
    pub reject_status: Mutex<StatusCode>,
    /// Fail `GET /auth/me` with 401.
    pub fail_me: AtomicBool,
    /// Body served by `GET /auth/me`.
    pub me_body: Mutex<serde_json::Value>,
    /// Tokens the protected endpoint accepts.
    pub accepted_tokens: Mutex<HashSet<String>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            login_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
            logout_hits: AtomicUsize::new(0),
            me_hits: AtomicUsize::new(0),
            protected_hits: AtomicUsize::new(0),
            login_token: Mutex::new(Some(fresh_jwt("u1"))),
            reject_login: AtomicBool::new(false),
            login_onboarded: AtomicBool::new(true),
            refresh: Mutex::new(RefreshBehavior::Reject),
            accept_refreshed: AtomicBool::new(true),
            require_refresh_cookie: AtomicBool::new(false),
            reject_status: Mutex::new(StatusCode::UNAUTHORIZED),
            fail_me: AtomicBool::new(false),
            me_body: Mutex::new(json!({ "nickname": "tester" })),
            accepted_tokens: Mutex::new(HashSet::new()),
        }
    }

    pub fn refresh_hits(&self) -> usize {
        self.refresh_hits.load(Ordering::SeqCst)
    }

    pub fn set_refresh(&self, behavior: RefreshBehavior) {
        *self.refresh.lock().unwrap() = behavior;
    }

    pub fn accept_token(&self, token: &str) {
        self.accepted_tokens.lock().unwrap().insert(token.to_string());
    }
}

/// The running mock backend.
pub(crate) struct MockBackend {
    addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Bind to an ephemeral loopback port and start serving.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::new());
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/moims", get(protected))
            .route("/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL of the mock.
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("mock base url")
    }
}

fn bearer_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn has_refresh_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| cookies.contains("refresh="))
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<serde_json::Value>) -> Response {
    state.login_hits.fetch_add(1, Ordering::SeqCst);

    if state.reject_login.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid email or password" })),
        )
            .into_response();
    }

    let email = body
        .get("email")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown@moim.example")
        .to_string();

    let mut payload = json!({
        "userId": "u1",
        "email": email,
        "name": "Test User",
        "nickname": "tester",
        "onboardingCompleted": state.login_onboarded.load(Ordering::SeqCst),
        "user": { "role": "user" }
    });
    if let Some(token) = state.login_token.lock().unwrap().clone() {
        state.accept_token(&token);
        payload["accessToken"] = json!(token);
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, "refresh=r1; HttpOnly; Path=/")],
        Json(payload),
    )
        .into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);

    if state.require_refresh_cookie.load(Ordering::SeqCst) && !has_refresh_cookie(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }

    match &*state.refresh.lock().unwrap() {
        RefreshBehavior::Token(token) => {
            if state.accept_refreshed.load(Ordering::SeqCst) {
                state.accept_token(token);
            }
            (StatusCode::OK, Json(json!({ "accessToken": token }))).into_response()
        }
        RefreshBehavior::Reject => (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response(),
        RefreshBehavior::EmptyBody => (StatusCode::OK, Json(json!({}))).into_response(),
    }
}

async fn logout(State(state): State<Arc<MockState>>) -> StatusCode {
    state.logout_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.me_hits.fetch_add(1, Ordering::SeqCst);

    if state.fail_me.load(Ordering::SeqCst) || bearer_of(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }

    let body = state.me_body.lock().unwrap().clone();
    (StatusCode::OK, Json(body)).into_response()
}

/// Public endpoint used to prove the wrapper attaches no bearer token
/// and runs no recovery on allowlisted paths: a bearer header is a test
/// failure, and the plain 401 must pass through untouched.
async fn health(headers: HeaderMap) -> Response {
    if bearer_of(&headers).is_some() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response();
    }
    (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response()
}

async fn protected(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.protected_hits.fetch_add(1, Ordering::SeqCst);

    let accepted = match bearer_of(&headers) {
        Some(token) => state.accepted_tokens.lock().unwrap().contains(&token),
        None => false,
    };
    if accepted {
        (StatusCode::OK, Json(json!({ "items": [] }))).into_response()
    } else {
        let status = *state.reject_status.lock().unwrap();
        (status, Json(json!({}))).into_response()
    }
}
