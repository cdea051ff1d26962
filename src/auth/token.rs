use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Access/refresh token pair with an absolute expiry.
///
/// A set is always complete: stores hand back `None` rather than a set with a
/// missing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_unix: u64,
}

impl TokenSet {
    /// Tokens inside this window count as expired so they get refreshed well ahead.
    pub const EXPIRY_SKEW: Duration = Duration::from_secs(15 * 60);

    pub fn new(access_token: String, refresh_token: String, expires_at_unix: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at_unix,
        }
    }

    pub fn issued_at(
        now: SystemTime,
        access_token: String,
        refresh_token: String,
        expires_in_secs: u64,
    ) -> Self {
        let expires_at_unix = unix_secs(now).saturating_add(expires_in_secs);
        Self::new(access_token, refresh_token, expires_at_unix)
    }

    /// Builds a set from possibly incomplete parts; any missing or empty part
    /// invalidates the whole set.
    pub fn from_parts(
        access_token: Option<String>,
        refresh_token: Option<String>,
        expires_at_unix: Option<u64>,
    ) -> Option<Self> {
        let access_token = access_token.filter(|value| !value.trim().is_empty())?;
        let refresh_token = refresh_token.filter(|value| !value.trim().is_empty())?;
        let expires_at_unix = expires_at_unix.filter(|value| *value > 0)?;
        Some(Self::new(access_token, refresh_token, expires_at_unix))
    }

    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        self.expires_in_seconds(now) > Self::EXPIRY_SKEW.as_secs() as i64
    }

    pub fn expires_in_seconds(&self, now: SystemTime) -> i64 {
        self.expires_at_unix as i64 - unix_secs(now) as i64
    }
}

pub(crate) fn unix_secs(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}
