use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("authorization rejected by provider ({status}): {body}")]
    ProviderRejected { status: u16, body: String },
    #[error("no valid access token available; re-authentication required")]
    AuthUnavailable,
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("rate limited by provider after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("network error after {attempts} attempts: {message}")]
    Network { attempts: u32, message: String },
    #[error("provider request failed ({status}): {body}")]
    Provider { status: u16, body: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// True for failures that leave the account waiting on interactive re-authorization.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, Self::AuthUnavailable | Self::AuthFailed(_))
    }
}
