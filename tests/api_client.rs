mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use goto_sms::api::SmsClient;
use goto_sms::auth::{MemoryTokenStore, TokenState};
use goto_sms::error::AppError;
use goto_sms::retry::RetryPolicy;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    CREDENTIAL_ID, CountingNotifier, TEST_BASE_DELAY, manager, requests_to, token_expiring_in,
    token_response, unreachable_base_url,
};

const MESSAGES_PATH: &str = "/messaging/v1/messages";
const TARGET: &str = "+15551234567";
const SENDER: &str = "+15557654321";

fn client(server: &MockServer, api_base: &str, notifier: Arc<CountingNotifier>) -> SmsClient {
    let store = Arc::new(MemoryTokenStore::with_token(
        CREDENTIAL_ID,
        token_expiring_in("a1", "r1", 3600),
    ));
    client_with_store(server, api_base, store, notifier)
}

fn client_with_store(
    server: &MockServer,
    api_base: &str,
    store: Arc<MemoryTokenStore>,
    notifier: Arc<CountingNotifier>,
) -> SmsClient {
    SmsClient::new(Arc::new(manager(server, store, notifier)))
        .expect("client should build")
        .with_base_url(api_base)
        .with_retry_policy(RetryPolicy::message_send().with_base_delay(TEST_BASE_DELAY))
}

async fn mount_refresh(server: &MockServer, status: u16, expected_calls: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(token_response("a2", Some("r2"), 3600))
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn sends_message_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header("Authorization", "Bearer a1"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "ownerPhoneNumber": SENDER,
            "contactPhoneNumbers": [TARGET],
            "body": "Front door opened"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "msg-42" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &server.uri(), Arc::default());
    let result = client
        .send("Front door opened", TARGET, SENDER)
        .await
        .expect("send should succeed");

    assert_eq!(result.target, TARGET);
    assert_eq!(result.status, 201);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.message_id.as_deref(), Some("msg-42"));
}

#[tokio::test]
async fn empty_target_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let client = client(&server, &server.uri(), Arc::default());

    let result = client.send("hello", "  ", SENDER).await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn refreshes_and_retries_after_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "msg-2" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, 200, 1).await;

    let notifier = Arc::new(CountingNotifier::default());
    let client = client(&server, &server.uri(), notifier.clone());
    let result = client
        .send("hello", TARGET, SENDER)
        .await
        .expect("send should succeed after refresh");

    assert_eq!(result.attempts, 2);
    assert_eq!(result.message_id.as_deref(), Some("msg-2"));
    assert_eq!(requests_to(&server, MESSAGES_PATH).await, 2);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn backs_off_when_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &server.uri(), Arc::default());
    let started = Instant::now();
    let result = client
        .send("hello", TARGET, SENDER)
        .await
        .expect("send should succeed after backoff");

    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(result.attempts, 3);
    assert_eq!(result.message_id, None);
}

#[tokio::test]
async fn gives_up_when_rate_limit_persists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server, &server.uri(), Arc::default());
    let result = client.send("hello", TARGET, SENDER).await;

    assert!(matches!(result, Err(AppError::RateLimited { attempts: 3 })));
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &server.uri(), Arc::default());

    match client.send("hello", TARGET, SENDER).await {
        Err(AppError::Provider { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_refresh_after_unauthorized_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, 401, 1).await;

    let notifier = Arc::new(CountingNotifier::default());
    let client = client(&server, &server.uri(), notifier.clone());
    let result = client.send("hello", TARGET, SENDER).await;

    assert!(matches!(result, Err(AppError::AuthFailed(_))));
    assert_eq!(notifier.count(), 1);
    assert_eq!(
        client.token_manager().state().await,
        TokenState::ReauthRequired
    );
}

#[tokio::test]
async fn persistent_unauthorized_requests_reauth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;
    mount_refresh(&server, 200, 2).await;

    let notifier = Arc::new(CountingNotifier::default());
    let client = client(&server, &server.uri(), notifier.clone());
    let result = client.send("hello", TARGET, SENDER).await;

    let err = result.expect_err("send should fail");
    assert!(matches!(err, AppError::AuthFailed(_)));
    assert!(err.needs_reauth());
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn missing_token_fails_without_sending() {
    let server = MockServer::start().await;
    let notifier = Arc::new(CountingNotifier::default());
    let client = client_with_store(
        &server,
        &server.uri(),
        Arc::new(MemoryTokenStore::new()),
        notifier.clone(),
    );

    let result = client.send("hello", TARGET, SENDER).await;

    assert!(matches!(result, Err(AppError::AuthUnavailable)));
    assert_eq!(requests_to(&server, MESSAGES_PATH).await, 0);
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn network_failures_are_retried_then_reported() {
    let server = MockServer::start().await;
    let unreachable = unreachable_base_url();

    let client = client(&server, &unreachable, Arc::default());
    let started = Instant::now();
    let result = client.send("hello", TARGET, SENDER).await;

    assert!(matches!(result, Err(AppError::Network { attempts: 3, .. })));
    assert!(started.elapsed() >= Duration::from_millis(30));
}
