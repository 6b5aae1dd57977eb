// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! OAuth 2.0 client credentials authentication.
//!
//! [`OAuthManager`] owns the request shape, response validation and token
//! caching. The HTTP exchange itself goes through a [`TokenEndpoint`], so any
//! blocking HTTP client can be plugged in.

use super::TokenProvider;
use crate::error::{Error, Result};
use crate::settings::Settings;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};
use url::form_urlencoded;

/// Lifetime assumed when the token response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Tokens this close to expiry are treated as already expired.
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 300;

/// A client-credentials form POST, ready to be sent.
#[derive(Clone)]
pub struct TokenRequest {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    pub form: Vec<(String, String)>,
    pub timeout: Duration,
}

impl TokenRequest {
    pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

    /// The url-encoded form body.
    pub fn form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form.iter())
            .finish()
    }

    /// The HTTP basic `Authorization` header value for the client credentials.
    pub fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("form", &self.form)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Status and body of a token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced a response (DNS, TLS, connect, timeout).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends the token request over HTTP.
pub trait TokenEndpoint: Send + Sync + fmt::Debug {
    fn post_form(
        &self,
        request: &TokenRequest,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Default)]
struct TokenState {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn is_expired(&self, buffer: TimeDelta, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => now + buffer >= expires_at,
            _ => true,
        }
    }
}

/// Snapshot of the cached token, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    pub has_token: bool,
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in_seconds: Option<i64>,
}

/// OAuth 2.0 client credentials token provider with caching.
pub struct OAuthManager {
    client_id: String,
    client_secret: String,
    scope: String,
    token_url: String,
    timeout: Duration,
    expiry_buffer: TimeDelta,
    endpoint: Arc<dyn TokenEndpoint>,
    state: Mutex<TokenState>,
}

impl OAuthManager {
    pub fn new(settings: &Settings, endpoint: Arc<dyn TokenEndpoint>) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            scope: settings.oauth_scope.clone(),
            token_url: settings.token_url(),
            timeout: settings.connection_timeout_duration(),
            expiry_buffer: TimeDelta::seconds(DEFAULT_EXPIRY_BUFFER_SECS),
            endpoint,
            state: Mutex::new(TokenState::default()),
        }
    }

    pub fn with_expiry_buffer(mut self, buffer: TimeDelta) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    // A poisoned lock only means a refresh panicked; the cached fields are
    // still coherent.
    fn lock_state(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn token_request(&self) -> TokenRequest {
        TokenRequest {
            url: self.token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            form: vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("scope".to_string(), self.scope.clone()),
            ],
            timeout: self.timeout,
        }
    }

    fn refresh(&self, state: &mut TokenState) -> Result<()> {
        info!("Refreshing OAuth access token");

        let response = self.endpoint.post_form(&self.token_request()).map_err(|e| {
            error!("Token request failed: {}", e);
            Error::authentication(format!("Network error while getting OAuth token: {e}"))
        })?;

        if response.status != 200 {
            error!("Token endpoint returned {}", response.status);
            return Err(Error::authentication(format!(
                "Failed to get OAuth token: {} - {}",
                response.status, response.body
            )));
        }

        let payload: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| Error::authentication(format!("Invalid token response: {e}")))?;
        let token = payload
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::authentication("Invalid token response: missing access_token"))?;

        let expires_in = payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let now = Utc::now();
        let expires_at = TimeDelta::try_seconds(expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);

        state.access_token = Some(token);
        state.expires_at = Some(expires_at);
        debug!("OAuth token valid until {}", expires_at);
        Ok(())
    }

    /// Drops the cached token so the next call fetches a new one.
    pub fn invalidate_token(&self) {
        *self.lock_state() = TokenState::default();
        debug!("OAuth token invalidated");
    }

    /// Whether a token is cached and outside the expiry buffer.
    pub fn is_authenticated(&self) -> bool {
        !self.lock_state().is_expired(self.expiry_buffer, Utc::now())
    }

    pub fn token_info(&self) -> TokenInfo {
        let state = self.lock_state();
        let now = Utc::now();
        TokenInfo {
            has_token: state.access_token.is_some(),
            is_expired: state.is_expired(self.expiry_buffer, now),
            expires_at: state.expires_at,
            expires_in_seconds: state.expires_at.map(|at| (at - now).num_seconds()),
        }
    }
}

impl TokenProvider for OAuthManager {
    fn get_access_token(&self, force_refresh: bool) -> Result<String> {
        let mut state = self.lock_state();

        if !force_refresh && !state.is_expired(self.expiry_buffer, Utc::now()) {
            if let Some(token) = &state.access_token {
                return Ok(token.clone());
            }
        }

        self.refresh(&mut state)?;
        state
            .access_token
            .clone()
            .ok_or_else(|| Error::authentication("No valid access token available"))
    }
}

impl fmt::Debug for OAuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthManager")
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .field("expiry_buffer", &self.expiry_buffer)
            .finish_non_exhaustive()
    }
}
