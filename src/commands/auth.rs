use std::io::{self, IsTerminal, Write};
use std::time::SystemTime;

use serde::Serialize;

use crate::auth::{TokenSet, TokenState, TokenStore, build_authorization_url};
use crate::cli::{AuthCommand, LoginArgs, RefreshArgs};
use crate::config::{self, Settings};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct AuthorizationUrl {
    pub profile: String,
    pub authorization_url: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub profile: String,
    pub logged_in: bool,
    pub state: TokenState,
    pub expires_in_seconds: Option<i64>,
    pub note: String,
}

impl AuthStatus {
    fn from_token(profile: &str, token: Option<&TokenSet>, state: TokenState, note: &str) -> Self {
        Self {
            profile: profile.to_string(),
            logged_in: token.is_some(),
            state,
            expires_in_seconds: token.map(|token| token.expires_in_seconds(SystemTime::now())),
            note: note.to_string(),
        }
    }

    fn text_line(&self) -> String {
        let state = match self.state {
            TokenState::Uninitialized => "logged out",
            TokenState::Valid => "logged in",
            TokenState::Stale => "logged in (token needs refresh)",
            TokenState::ReauthRequired => "re-authentication required",
        };
        match self.expires_in_seconds {
            Some(secs) if secs > 0 => format!("{}: {state}, token expires in {secs}s", self.profile),
            Some(_) => format!("{}: {state}, token expired", self.profile),
            None => format!("{}: {state}", self.profile),
        }
    }
}

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Url => {
            let settings = ensure_login_settings(ctx)?;
            let url = build_authorization_url(&settings.endpoints(), settings.client_id())?;
            let result = AuthorizationUrl {
                profile: ctx.profile.clone(),
                authorization_url: url.to_string(),
            };
            ctx.output.emit(&result.authorization_url, &result)
        }
        AuthCommand::Login(args) => login(ctx, args).await,
        AuthCommand::Status => {
            let token = ctx.token_store.load(&ctx.profile).await?;
            let state = match &token {
                None => TokenState::Uninitialized,
                Some(token) if token.is_valid_at(SystemTime::now()) => TokenState::Valid,
                Some(_) => TokenState::Stale,
            };
            let note = if token.is_some() {
                "token loaded from local store"
            } else {
                "no token found"
            };
            let status = AuthStatus::from_token(&ctx.profile, token.as_ref(), state, note);
            ctx.output.emit(&status.text_line(), &status)
        }
        AuthCommand::Refresh(args) => refresh(ctx, args).await,
        AuthCommand::Logout => {
            ctx.token_store.clear(&ctx.profile).await?;
            let status = AuthStatus::from_token(
                &ctx.profile,
                None,
                TokenState::Uninitialized,
                "local tokens removed",
            );
            ctx.output.emit(&status.text_line(), &status)
        }
    }
}

async fn login(ctx: &AppContext, args: LoginArgs) -> AppResult<()> {
    let settings = ensure_login_settings(ctx)?;
    let manager = ctx.token_manager_for(&settings)?;

    let response = match args.response {
        Some(response) => response,
        None => {
            if !io::stdin().is_terminal() {
                return Err(AppError::InvalidInput(
                    "pass the redirect URL or authorization code as an argument".to_string(),
                ));
            }
            println!("Open this URL in your browser and approve access:");
            println!("{}", manager.authorization_url()?);
            prompt_required("Paste the redirect URL or code: ")?
        }
    };

    let token = manager.exchange_code(&response).await?;
    let status = AuthStatus::from_token(
        &ctx.profile,
        Some(&token),
        TokenState::Valid,
        "authorization code exchanged and tokens stored",
    );
    ctx.output.emit(&status.text_line(), &status)
}

async fn refresh(ctx: &AppContext, args: RefreshArgs) -> AppResult<()> {
    let manager = ctx.token_manager()?;

    let token = if args.force {
        if !manager.load().await? {
            return Err(AppError::AuthUnavailable);
        }
        if !manager.refresh().await {
            return Err(AppError::AuthFailed("token refresh failed".to_string()));
        }
        manager.token_set().await
    } else {
        manager.ensure_fresh().await
    };

    let Some(token) = token else {
        return Err(AppError::AuthUnavailable);
    };
    let status = AuthStatus::from_token(
        &ctx.profile,
        Some(&token),
        manager.state().await,
        "token is valid",
    );
    ctx.output.emit(&status.text_line(), &status)
}

fn ensure_login_settings(ctx: &AppContext) -> AppResult<Settings> {
    let mut settings = ctx.settings.clone();
    let missing_client_id = settings.client_id().is_none();
    let missing_client_secret = settings.client_secret().is_none();

    if !missing_client_id && !missing_client_secret {
        return Ok(settings);
    }

    let settings_path = ctx.paths.settings_file(&ctx.profile);
    if !io::stdin().is_terminal() {
        let missing = format_missing_fields(missing_client_id, missing_client_secret);
        return Err(AppError::Config(format!(
            "missing oauth {missing} in {}. run this command in an interactive terminal to be prompted, or add the values manually",
            settings_path.display(),
        )));
    }

    println!(
        "GoTo OAuth client config is missing for profile `{}`.",
        ctx.profile
    );
    println!("Settings will be saved to {}.", settings_path.display());

    if missing_client_id {
        settings.client_id = Some(prompt_required("OAuth client_id: ")?);
    }

    if missing_client_secret {
        settings.client_secret = Some(prompt_required("OAuth client_secret: ")?);
    }

    if settings.sender_id().is_none() {
        let sender_id = prompt_line("Default sender number (E.164, optional): ")?;
        if !sender_id.is_empty() {
            settings.sender_id = Some(sender_id);
        }
    }

    config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
    println!("Saved profile settings to {}.", settings_path.display());

    Ok(settings)
}

fn format_missing_fields(missing_client_id: bool, missing_client_secret: bool) -> String {
    match (missing_client_id, missing_client_secret) {
        (true, true) => "client_id and client_secret".to_string(),
        (true, false) => "client_id".to_string(),
        (false, true) => "client_secret".to_string(),
        (false, false) => "configuration".to_string(),
    }
}

fn prompt_required(prompt: &str) -> AppResult<String> {
    loop {
        let value = prompt_line(prompt)?;
        if !value.is_empty() {
            return Ok(value);
        }
        eprintln!("value is required");
    }
}

fn prompt_line(prompt: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}
