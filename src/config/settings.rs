use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::client::GOTO_API_BASE_URL;
use crate::auth::{Credentials, OAuthEndpoints};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// GoTo number (E.164) used as the sender when `--from` is omitted.
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl Settings {
    pub fn client_id(&self) -> Option<&str> {
        non_empty(self.client_id.as_deref())
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_empty(self.client_secret.as_deref())
    }

    pub fn sender_id(&self) -> Option<&str> {
        non_empty(self.sender_id.as_deref())
    }

    pub fn credentials(&self) -> AppResult<Credentials> {
        let client_id = self.client_id().ok_or_else(|| {
            AppError::Config(
                "missing oauth client_id in profile settings. run `goto-sms auth login`"
                    .to_string(),
            )
        })?;
        let client_secret = self.client_secret().ok_or_else(|| {
            AppError::Config(
                "missing oauth client_secret in profile settings. run `goto-sms auth login`"
                    .to_string(),
            )
        })?;

        Credentials::new(client_id, client_secret)
    }

    pub fn endpoints(&self) -> OAuthEndpoints {
        let defaults = OAuthEndpoints::default();
        OAuthEndpoints {
            authorize_url: self.authorize_url.clone().unwrap_or(defaults.authorize_url),
            token_url: self.token_url.clone().unwrap_or(defaults.token_url),
            redirect_uri: defaults.redirect_uri,
        }
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| GOTO_API_BASE_URL.to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}

pub fn save(path: PathBuf, settings: &Settings) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(&path, payload)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}
