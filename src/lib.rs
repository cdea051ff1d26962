//! OAuth2-authorized SMS delivery through the GoTo Connect messaging API.
//!
//! [`auth::OAuthTokenManager`] keeps one credential's token set fresh and
//! persisted; [`api::SmsClient`] sends messages with it, refreshing on 401 and
//! backing off on rate limits and transport errors.

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;
pub mod retry;

use cli::Cli;
use error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    logging::init(cli.verbose)?;
    app::run(cli).await
}
