// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Moim

//! Authenticated API client with one-shot 401 recovery.

use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::{SessionManager, SESSION_EXPIRED_REASON};

/// API client wrapping the shared HTTP client.
///
/// Holds the session manager by value (cheap clone, shared innards);
/// the underlying `reqwest::Client` and its cookie jar are the same
/// ones the manager uses for refresh, so the refresh cookie is always
/// in scope.
#[derive(Clone)]
pub struct ApiClient {
    session: SessionManager,
}

impl ApiClient {
    /// Create a client over the given session manager.
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    /// `GET` an API path.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<Response, SessionError> {
        self.request(Method::GET, path, None).await
    }

    /// `POST` an API path with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, SessionError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    /// `PUT` an API path with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, SessionError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    /// `DELETE` an API path.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<Response, SessionError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Issue a request with bearer injection and one-shot 401 recovery.
    ///
    /// Public paths get no bearer token and no recovery. On a
    /// protected path, a missing token is not a client-side error: the
    /// backend rejects and the recovery path handles it (the cookie may
    /// still mint a token). At most one refresh and one replay happen
    /// per call; a second rejection is returned to the caller as-is.
    ///
    /// # Errors
    ///
    /// [`SessionError::Transport`] for network failures, or
    /// [`SessionError::UnexpectedStatus`] when an auth-rejected request
    /// could not be recovered (the session has been torn down silently
    /// by then).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, SessionError> {
        let url = self
            .session
            .config()
            .endpoint(path)
            .map_err(|source| SessionError::InvalidEndpoint {
                path: path.to_string(),
                source,
            })?;

        let public = self.session.config().is_public_path(path);
        let mut bearer = if public {
            None
        } else {
            self.session.access_token().await
        };

        // One initial attempt plus at most one recovery replay. The
        // retry budget is structural, so it cannot loop on a refresh
        // that keeps minting dead tokens.
        let mut recovered = false;
        loop {
            let mut request = self.session.http().request(method.clone(), url.clone());
            if let Some(body) = &body {
                request = request.json(body);
            }
            if let Some(bearer) = &bearer {
                request = request.bearer_auth(bearer);
            }

            let response = request.send().await?;
            let status = response.status();
            let auth_rejected =
                matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);

            if !auth_rejected || public || recovered {
                return Ok(response);
            }

            debug!(%path, %status, "auth rejected, attempting token refresh");
            match self.session.refresh_access_token(bearer.as_deref()).await {
                Some(fresh) => {
                    bearer = Some(fresh);
                    recovered = true;
                }
                None => {
                    warn!(%path, "refresh after auth rejection failed");
                    self.session.logout_silently(SESSION_EXPIRED_REASON).await;
                    return Err(SessionError::UnexpectedStatus {
                        endpoint: path.to_string(),
                        status: status.as_u16(),
                    });
                }
            }
        }
    }
}
