use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::error::{AppError, AppResult};

pub const LOG_ENV: &str = "GOTO_SMS_LOG";

/// Installs the global subscriber. Logs go to stderr so `--json` output on
/// stdout stays machine readable.
pub fn init(verbose: u8) -> AppResult<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|err| AppError::Config(format!("invalid {LOG_ENV} filter: {err}")))?,
        _ => EnvFilter::new(default_directive(verbose)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_span_events(if verbose >= 3 {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| AppError::Config(format!("failed to initialize logging: {err}")))
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "goto_sms=warn",
        1 => "goto_sms=info",
        2 => "goto_sms=debug",
        _ => "goto_sms=trace,reqwest=debug",
    }
}
