use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::auth::OAuthTokenManager;
use crate::auth::oauth::HTTP_TIMEOUT;
use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

use super::messages;
use super::models::{SendResult, SmsRequest, SmsSendResponse};

pub const GOTO_API_BASE_URL: &str = "https://api.goto.com";

/// Sends SMS through the GoTo messaging API on behalf of one credential.
///
/// A 401 triggers a token refresh and a retry with the new token; 429 and
/// transport errors back off exponentially. Both draw from one retry budget.
#[derive(Debug, Clone)]
pub struct SmsClient {
    http: Client,
    base_url: String,
    manager: Arc<OAuthTokenManager>,
    retry: RetryPolicy,
}

impl SmsClient {
    pub fn new(manager: Arc<OAuthTokenManager>) -> AppResult<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: GOTO_API_BASE_URL.to_string(),
            manager,
            retry: RetryPolicy::message_send(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn token_manager(&self) -> &OAuthTokenManager {
        &self.manager
    }

    pub async fn send(&self, message: &str, target: &str, sender_id: &str) -> AppResult<SendResult> {
        let request = SmsRequest::new(message, target, sender_id)?;
        let url = self.endpoint_url(messages::send_endpoint())?;
        let max_attempts = self.retry.max_attempts();
        let mut retries = 0;

        loop {
            let attempt = retries + 1;
            let headers = self.manager.auth_headers().await;
            if headers.is_empty() {
                error!("no valid access token; re-authentication has been requested");
                return Err(AppError::AuthUnavailable);
            }

            info!(
                attempt,
                max_attempts,
                target = request.target(),
                "sending sms"
            );
            debug!(body = %messages::preview(&request.body, 50), "sms body");

            let outcome = self
                .http
                .post(url.clone())
                .headers(headers)
                .json(&request)
                .send()
                .await;

            let response = match outcome {
                Ok(response) => response,
                Err(err) => {
                    warn!(attempt, max_attempts, error = %err, "network error while sending sms");
                    if retries < self.retry.max_retries {
                        retries += 1;
                        self.retry.wait(retries).await;
                        continue;
                    }
                    return Err(AppError::Network {
                        attempts: attempt,
                        message: err.to_string(),
                    });
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = response.text().await.unwrap_or_default();
                info!(status = status.as_u16(), attempt, "sms accepted");
                return Ok(SendResult {
                    target: request.target().to_string(),
                    status: status.as_u16(),
                    attempts: attempt,
                    message_id: parse_message_id(&body),
                    note: "message accepted by goto messaging api".to_string(),
                });
            }

            match status {
                StatusCode::UNAUTHORIZED => {
                    warn!(attempt, max_attempts, "access token rejected by messaging api");
                    if retries >= self.retry.max_retries {
                        self.manager.require_reauth().await;
                        return Err(AppError::AuthFailed(format!(
                            "access token still rejected after {attempt} attempts"
                        )));
                    }
                    if !self.manager.refresh().await {
                        return Err(AppError::AuthFailed(
                            "token refresh failed after the provider rejected the access token"
                                .to_string(),
                        ));
                    }
                    retries += 1;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!(attempt, max_attempts, "rate limited by messaging api");
                    if retries >= self.retry.max_retries {
                        return Err(AppError::RateLimited { attempts: attempt });
                    }
                    retries += 1;
                    self.retry.wait(retries).await;
                }
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    error!(status = status.as_u16(), body = %body, "sms rejected");
                    return Err(AppError::Provider {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        join_endpoint(&self.base_url, endpoint)
    }
}

/// Appends `endpoint` below whatever path prefix `base_url` already carries.
fn join_endpoint(base_url: &str, endpoint: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("api base url `{base_url}` cannot carry a path")))?
        .pop_if_empty()
        .extend(endpoint.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

fn parse_message_id(body: &str) -> Option<String> {
    serde_json::from_str::<SmsSendResponse>(body)
        .ok()
        .and_then(|response| response.id)
        .filter(|id| !id.is_empty())
}
