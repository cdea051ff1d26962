use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "goto-sms", version, about = "Send SMS through GoTo Connect")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile (credential) name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Keep config and tokens under this directory")]
    pub home: Option<PathBuf>,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    Send(SendArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Print the URL to open for authorization
    Url,
    /// Exchange the redirect URL (or bare code) for tokens
    Login(LoginArgs),
    Status,
    /// Refresh the access token if it is close to expiry
    Refresh(RefreshArgs),
    Logout,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(help = "Redirect URL, query string, or authorization code")]
    pub response: Option<String>,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    #[arg(long, help = "Refresh even if the current token is still valid")]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[arg(long, help = "Destination number in E.164 format")]
    pub to: String,
    #[arg(long, help = "GoTo sender number in E.164 format (defaults to profile sender_id)")]
    pub from: Option<String>,
    #[arg(help = "Message text")]
    pub message: String,
}
