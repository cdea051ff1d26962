use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::config::AppPaths;
use crate::error::AppResult;

use super::TokenSet;

/// Durable home for a credential's token set, keyed by an opaque credential id.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, credential_id: &str) -> AppResult<Option<TokenSet>>;
    async fn save(&self, credential_id: &str, token: &TokenSet) -> AppResult<()>;
    async fn clear(&self, credential_id: &str) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    paths: AppPaths,
}

impl FileTokenStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }
}

/// On-disk shape. Every field is optional so that a hand-edited or truncated
/// file degrades to "no tokens" instead of a parse error.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenRecord {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at_unix: Option<u64>,
}

impl From<&TokenSet> for TokenRecord {
    fn from(token: &TokenSet) -> Self {
        Self {
            access_token: Some(token.access_token.clone()),
            refresh_token: Some(token.refresh_token.clone()),
            expires_at_unix: Some(token.expires_at_unix),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, credential_id: &str) -> AppResult<Option<TokenSet>> {
        let path = self.paths.token_file(credential_id);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).await?;
        let record: TokenRecord = serde_json::from_str(&raw)?;
        let token = TokenSet::from_parts(
            record.access_token,
            record.refresh_token,
            record.expires_at_unix,
        );
        if token.is_none() {
            tracing::warn!(path = %path.display(), "stored token record is incomplete; ignoring it");
        }

        Ok(token)
    }

    async fn save(&self, credential_id: &str, token: &TokenSet) -> AppResult<()> {
        let path = self.paths.token_file(credential_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_string_pretty(&TokenRecord::from(token))?;
        fs::write(&path, payload).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path).await?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).await?;
        }

        Ok(())
    }

    async fn clear(&self, credential_id: &str) -> AppResult<()> {
        let path = self.paths.token_file(credential_id);
        if fs::try_exists(&path).await? {
            fs::remove_file(path).await?;
        }

        Ok(())
    }
}

/// Process-local store for hosts that persist tokens themselves, and for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, TokenSet>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(credential_id: &str, token: TokenSet) -> Self {
        Self {
            tokens: Mutex::new(HashMap::from([(credential_id.to_string(), token)])),
        }
    }

    pub async fn get(&self, credential_id: &str) -> Option<TokenSet> {
        self.tokens.lock().await.get(credential_id).cloned()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self, credential_id: &str) -> AppResult<Option<TokenSet>> {
        Ok(self.get(credential_id).await)
    }

    async fn save(&self, credential_id: &str, token: &TokenSet) -> AppResult<()> {
        self.tokens
            .lock()
            .await
            .insert(credential_id.to_string(), token.clone());
        Ok(())
    }

    async fn clear(&self, credential_id: &str) -> AppResult<()> {
        self.tokens.lock().await.remove(credential_id);
        Ok(())
    }
}
