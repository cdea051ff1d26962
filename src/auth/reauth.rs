use tokio::sync::mpsc;

/// Told when a credential can no longer be refreshed automatically and the
/// user has to authorize again.
pub trait ReauthNotifier: Send + Sync {
    fn notify_reauth_required(&self, credential_id: &str);
}

/// Writes a warning to the log. Used by the command line binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReauthNotifier;

impl ReauthNotifier for LogReauthNotifier {
    fn notify_reauth_required(&self, credential_id: &str) {
        tracing::warn!(
            credential_id,
            "re-authentication required; run `goto-sms --profile {credential_id} auth login`"
        );
    }
}

/// Forwards re-authentication requests to a host-owned receiver.
#[derive(Debug, Clone)]
pub struct ChannelReauthNotifier {
    sender: mpsc::UnboundedSender<ReauthRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReauthRequest {
    pub credential_id: String,
}

impl ChannelReauthNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReauthRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ReauthNotifier for ChannelReauthNotifier {
    fn notify_reauth_required(&self, credential_id: &str) {
        let request = ReauthRequest {
            credential_id: credential_id.to_string(),
        };
        if self.sender.send(request).is_err() {
            tracing::warn!(credential_id, "re-auth receiver dropped; request lost");
        }
    }
}
