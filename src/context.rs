use std::path::PathBuf;
use std::sync::Arc;

use crate::api::SmsClient;
use crate::auth::{FileTokenStore, LogReauthNotifier, OAuthTokenManager};
use crate::config::{self, AppPaths, Settings};
use crate::error::AppResult;
use crate::output::Output;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub paths: AppPaths,
    pub settings: Settings,
    pub token_store: Arc<FileTokenStore>,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, home: Option<PathBuf>, json: bool) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile)?;
        let paths = match home {
            Some(root) => AppPaths::at(root)?,
            None => AppPaths::discover()?,
        };
        let settings = config::load_settings(&paths, &profile)?;
        let token_store = Arc::new(FileTokenStore::new(paths.clone()));
        let output = Output::new(json);

        Ok(Self {
            profile,
            paths,
            settings,
            token_store,
            output,
        })
    }

    pub fn token_manager(&self) -> AppResult<Arc<OAuthTokenManager>> {
        self.token_manager_for(&self.settings)
    }

    pub fn token_manager_for(&self, settings: &Settings) -> AppResult<Arc<OAuthTokenManager>> {
        let manager = OAuthTokenManager::new(
            self.profile.clone(),
            settings.credentials()?,
            self.token_store.clone(),
            Arc::new(LogReauthNotifier),
        )?
        .with_endpoints(settings.endpoints());

        Ok(Arc::new(manager))
    }

    pub fn sms_client(&self) -> AppResult<SmsClient> {
        let client =
            SmsClient::new(self.token_manager()?)?.with_base_url(self.settings.api_base_url());
        Ok(client)
    }
}
