use std::sync::Arc;
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

use super::code::extract_authorization_code;
use super::reauth::ReauthNotifier;
use super::token::TokenSet;
use super::token_store::TokenStore;

pub const GOTO_AUTHORIZE_ENDPOINT: &str = "https://authentication.logmeininc.com/oauth/authorize";
pub const GOTO_TOKEN_ENDPOINT: &str = "https://authentication.logmeininc.com/oauth/token";
pub const OAUTH_REDIRECT_URI: &str = "https://home-assistant.io/auth/callback";
pub const OAUTH_SCOPE: &str = "messaging.v1.send";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> AppResult<Self> {
        let client_id = client_id.into().trim().to_string();
        let client_secret = client_secret.into().trim().to_string();
        if client_id.is_empty() {
            return Err(AppError::Config("oauth client_id is not set".to_string()));
        }
        if client_secret.is_empty() {
            return Err(AppError::Config("oauth client_secret is not set".to_string()));
        }

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn basic_auth_value(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: GOTO_AUTHORIZE_ENDPOINT.to_string(),
            token_url: GOTO_TOKEN_ENDPOINT.to_string(),
            redirect_uri: OAUTH_REDIRECT_URI.to_string(),
        }
    }
}

pub fn build_authorization_url(endpoints: &OAuthEndpoints, client_id: Option<&str>) -> AppResult<Url> {
    let client_id = client_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Config("oauth client_id is not set".to_string()))?;

    let mut url = Url::parse(&endpoints.authorize_url)?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", &endpoints.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", OAUTH_SCOPE);

    Ok(url)
}

/// Lifecycle position of the manager's token set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Uninitialized,
    Valid,
    Stale,
    ReauthRequired,
}

#[derive(Debug, Default)]
struct ManagerState {
    tokens: Option<TokenSet>,
    /// Cleared only by a successful code exchange or by `clear`.
    reauth_pending: bool,
}

#[derive(Debug)]
enum RefreshFailure {
    /// The refresh token itself was refused; retrying cannot help.
    Terminal { status: StatusCode, body: String },
    Transient(String),
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
}

/// Keeps one credential's bearer token usable.
///
/// All token mutations (load, exchange, refresh, clear) run under a single
/// async lock, so concurrent callers never refresh the same refresh token twice
/// and persistence finishes before the lock is released.
pub struct OAuthTokenManager {
    credential_id: String,
    credentials: Credentials,
    endpoints: OAuthEndpoints,
    http: Client,
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn ReauthNotifier>,
    retry: RetryPolicy,
    state: Mutex<ManagerState>,
}

impl OAuthTokenManager {
    pub fn new(
        credential_id: impl Into<String>,
        credentials: Credentials,
        store: Arc<dyn TokenStore>,
        notifier: Arc<dyn ReauthNotifier>,
    ) -> AppResult<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            credential_id: credential_id.into(),
            credentials,
            endpoints: OAuthEndpoints::default(),
            http,
            store,
            notifier,
            retry: RetryPolicy::token_refresh(),
            state: Mutex::new(ManagerState::default()),
        })
    }

    pub fn with_endpoints(mut self, endpoints: OAuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn credential_id(&self) -> &str {
        &self.credential_id
    }

    pub fn authorization_url(&self) -> AppResult<Url> {
        build_authorization_url(&self.endpoints, Some(self.credentials.client_id()))
    }

    /// Reads the persisted token set into memory. Returns whether one was found.
    pub async fn load(&self) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        self.load_locked(&mut state).await
    }

    pub async fn is_valid(&self) -> bool {
        let state = self.state.lock().await;
        state
            .tokens
            .as_ref()
            .is_some_and(|token| token.is_valid_at(SystemTime::now()))
    }

    pub async fn state(&self) -> TokenState {
        let state = self.state.lock().await;
        if state.reauth_pending {
            return TokenState::ReauthRequired;
        }

        match &state.tokens {
            None => TokenState::Uninitialized,
            Some(token) if token.is_valid_at(SystemTime::now()) => TokenState::Valid,
            Some(_) => TokenState::Stale,
        }
    }

    pub async fn token_set(&self) -> Option<TokenSet> {
        self.state.lock().await.tokens.clone()
    }

    #[instrument(skip_all, fields(credential_id = %self.credential_id))]
    pub async fn exchange_code(&self, authorization_response: &str) -> AppResult<TokenSet> {
        let code = extract_authorization_code(authorization_response).ok_or_else(|| {
            AppError::InvalidInput("no authorization code found in response".to_string())
        })?;

        let mut state = self.state.lock().await;
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.endpoints.redirect_uri.as_str()),
        ];
        let response = self.post_token_request(&form).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "authorization code exchange rejected");
            return Err(AppError::ProviderRejected {
                status: status.as_u16(),
                body,
            });
        }

        let payload: OAuthTokenResponse = response.json().await?;
        let refresh_token = payload.refresh_token.ok_or_else(|| AppError::Provider {
            status: status.as_u16(),
            body: "token response is missing refresh_token".to_string(),
        })?;
        let token = TokenSet::issued_at(
            SystemTime::now(),
            payload.access_token,
            refresh_token,
            payload.expires_in,
        );

        self.store.save(&self.credential_id, &token).await?;
        state.tokens = Some(token.clone());
        state.reauth_pending = false;
        info!(expires_in = payload.expires_in, "authorization code exchanged");

        Ok(token)
    }

    /// Trades the stored refresh token for a new token set.
    ///
    /// Fires the re-auth signal and returns false when the refresh token is
    /// refused (400/401), every retry failed, or the new set could not be
    /// persisted. Once re-auth is pending this returns false without a request
    /// until `exchange_code` succeeds.
    pub async fn refresh(&self) -> bool {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Loads and proactively refreshes as needed; returns the usable token set.
    pub async fn ensure_fresh(&self) -> Option<TokenSet> {
        let mut state = self.state.lock().await;
        if state.reauth_pending {
            debug!("re-authentication pending; no token available");
            return None;
        }

        if state.tokens.is_none() {
            let loaded = match self.load_locked(&mut state).await {
                Ok(loaded) => loaded,
                Err(err) => {
                    error!(error = %err, "failed to load stored tokens");
                    false
                }
            };
            if !loaded {
                self.signal_reauth(&mut state);
                return None;
            }
        }

        let valid = state
            .tokens
            .as_ref()
            .is_some_and(|token| token.is_valid_at(SystemTime::now()));
        if !valid {
            debug!("token inside expiry window; refreshing");
            if !self.refresh_locked(&mut state).await {
                return None;
            }
        }

        state.tokens.clone()
    }

    pub async fn get_valid_token(&self) -> Option<String> {
        self.ensure_fresh().await.map(|token| token.access_token)
    }

    /// Bearer headers for the messaging API, or an empty map when no token can be had.
    pub async fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(token) = self.get_valid_token().await else {
            return headers;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Err(err) => error!(error = %err, "access token is not a valid header value"),
        }

        headers
    }

    /// Raises the re-auth signal unless one is already outstanding.
    pub async fn require_reauth(&self) {
        let mut state = self.state.lock().await;
        self.signal_reauth(&mut state);
    }

    pub async fn clear(&self) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.tokens = None;
        state.reauth_pending = false;
        self.store.clear(&self.credential_id).await
    }

    async fn load_locked(&self, state: &mut ManagerState) -> AppResult<bool> {
        let token = self.store.load(&self.credential_id).await?;
        let found = token.is_some();
        if found {
            state.tokens = token;
        } else {
            debug!(credential_id = %self.credential_id, "no stored tokens");
        }
        Ok(found)
    }

    #[instrument(skip_all, fields(credential_id = %self.credential_id))]
    async fn refresh_locked(&self, state: &mut ManagerState) -> bool {
        if state.reauth_pending {
            debug!("re-authentication pending; skipping refresh");
            return false;
        }

        if state.tokens.is_none() {
            if let Err(err) = self.load_locked(state).await {
                error!(error = %err, "failed to load stored tokens");
            }
        }

        let Some(refresh_token) = state.tokens.as_ref().map(|token| token.refresh_token.clone())
        else {
            error!("no refresh token available");
            self.signal_reauth(state);
            return false;
        };

        let max_attempts = self.retry.max_attempts();
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_for(attempt - 1);
                debug!(delay_ms = delay.as_millis() as u64, "waiting before refresh retry");
                self.retry.wait(attempt - 1).await;
            }

            info!(attempt, max_attempts, "refreshing access token");
            match self.request_refresh(&refresh_token).await {
                Ok(token) => {
                    if let Err(err) = self.store.save(&self.credential_id, &token).await {
                        error!(error = %err, "refreshed tokens could not be persisted");
                        break;
                    }
                    state.tokens = Some(token);
                    info!("access token refreshed");
                    return true;
                }
                Err(RefreshFailure::Terminal { status, body }) => {
                    error!(status = status.as_u16(), body = %body, "refresh token rejected");
                    break;
                }
                Err(RefreshFailure::Transient(reason)) => {
                    warn!(attempt, max_attempts, reason = %reason, "token refresh attempt failed");
                }
            }
        }

        error!("token refresh failed; re-authentication required");
        self.signal_reauth(state);
        false
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenSet, RefreshFailure> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let response = self
            .post_token_request(&form)
            .await
            .map_err(|err| RefreshFailure::Transient(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshFailure::Terminal { status, body });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshFailure::Transient(format!("{status}: {body}")));
        }

        let payload: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|err| RefreshFailure::Transient(format!("invalid token response: {err}")))?;

        Ok(TokenSet::issued_at(
            SystemTime::now(),
            payload.access_token,
            payload
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            payload.expires_in,
        ))
    }

    async fn post_token_request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(&self.endpoints.token_url)
            .header(AUTHORIZATION, self.credentials.basic_auth_value())
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
    }

    /// Enters `ReauthRequired`, notifying only on the transition.
    fn signal_reauth(&self, state: &mut ManagerState) {
        if state.reauth_pending {
            return;
        }
        state.reauth_pending = true;
        self.notifier.notify_reauth_required(&self.credential_id);
    }
}

impl std::fmt::Debug for OAuthTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenManager")
            .field("credential_id", &self.credential_id)
            .field("client_id", &self.credentials.client_id)
            .field("endpoints", &self.endpoints)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
