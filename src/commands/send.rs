use crate::cli::SendArgs;
use crate::config::Settings;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

pub async fn run(ctx: &AppContext, args: SendArgs) -> AppResult<()> {
    let sender_id = resolve_sender(&ctx.settings, args.from.as_deref())?;
    let client = ctx.sms_client()?;
    let result = client.send(&args.message, &args.to, &sender_id).await?;

    let text = match result.message_id.as_deref() {
        Some(id) => format!("sent message {id} to {}", result.target),
        None => format!("sent message to {}", result.target),
    };
    ctx.output.emit(&text, &result)
}

fn resolve_sender(settings: &Settings, from: Option<&str>) -> AppResult<String> {
    from.map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| settings.sender_id())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            AppError::InvalidInput(
                "no sender number; pass --from or set sender_id in the profile settings"
                    .to_string(),
            )
        })
}
