use crate::cli::{Cli, Command};
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    let Cli {
        profile,
        home,
        json,
        command,
        ..
    } = cli;

    let ctx = AppContext::bootstrap(profile, home, json)?;
    tracing::debug!(
        profile = %ctx.profile,
        config_dir = %ctx.paths.config_dir().display(),
        data_dir = %ctx.paths.data_dir().display(),
        "context ready"
    );

    match command {
        Command::Auth(args) => commands::auth::run(&ctx, args.command).await,
        Command::Send(args) => commands::send::run(&ctx, args).await,
    }
}
