pub fn send_endpoint() -> &'static str {
    "/messaging/v1/messages"
}

/// Shortens a message body for log lines without splitting a character.
pub fn preview(body: &str, max_chars: usize) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
