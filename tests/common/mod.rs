#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use goto_sms::auth::oauth::OAUTH_REDIRECT_URI;
use goto_sms::auth::{
    Credentials, MemoryTokenStore, OAuthEndpoints, OAuthTokenManager, ReauthNotifier, TokenSet,
    TokenStore,
};
use goto_sms::retry::RetryPolicy;
use serde_json::json;
use wiremock::MockServer;

pub const CREDENTIAL_ID: &str = "entry-1";
pub const BASIC_AUTH: &str = "Basic Y2xpZW50OnNlY3JldA==";
pub const TEST_BASE_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
pub struct CountingNotifier {
    calls: AtomicUsize,
    ids: Mutex<Vec<String>>,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.lock().map(|ids| ids.clone()).unwrap_or_default()
    }
}

impl ReauthNotifier for CountingNotifier {
    fn notify_reauth_required(&self, credential_id: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut ids) = self.ids.lock() {
            ids.push(credential_id.to_string());
        }
    }
}

pub fn token_expiring_in(access: &str, refresh: &str, secs: u64) -> TokenSet {
    TokenSet::issued_at(
        SystemTime::now(),
        access.to_string(),
        refresh.to_string(),
        secs,
    )
}

pub fn endpoints(server: &MockServer) -> OAuthEndpoints {
    OAuthEndpoints {
        authorize_url: format!("{}/oauth/authorize", server.uri()),
        token_url: format!("{}/oauth/token", server.uri()),
        redirect_uri: OAUTH_REDIRECT_URI.to_string(),
    }
}

pub fn manager(
    server: &MockServer,
    store: Arc<MemoryTokenStore>,
    notifier: Arc<CountingNotifier>,
) -> OAuthTokenManager {
    manager_with_store(server, store, notifier)
}

pub fn manager_with_store(
    server: &MockServer,
    store: Arc<dyn TokenStore>,
    notifier: Arc<CountingNotifier>,
) -> OAuthTokenManager {
    OAuthTokenManager::new(
        CREDENTIAL_ID,
        Credentials::new("client", "secret").expect("credentials"),
        store,
        notifier,
    )
    .expect("manager should build")
    .with_endpoints(endpoints(server))
    .with_retry_policy(RetryPolicy::token_refresh().with_base_delay(TEST_BASE_DELAY))
}

pub fn token_response(access: &str, refresh: Option<&str>, expires_in: u64) -> serde_json::Value {
    match refresh {
        Some(refresh) => json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": expires_in,
            "token_type": "Bearer"
        }),
        None => json!({
            "access_token": access,
            "expires_in": expires_in,
            "token_type": "Bearer"
        }),
    }
}

pub async fn requests_to(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}

/// Base URL of a local port with nothing listening on it.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    format!("http://{addr}")
}
