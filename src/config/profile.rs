use crate::error::{AppError, AppResult};

/// Profile names double as token-store keys and file names.
pub fn resolve_profile(requested: &str) -> AppResult<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Ok("default".to_string());
    }

    let allowed = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.');
    if trimmed.starts_with('.') || !trimmed.chars().all(allowed) {
        return Err(AppError::InvalidInput(format!(
            "profile `{trimmed}` may only contain letters, digits, `-`, `_` and `.`"
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_profile_falls_back_to_default() {
        assert_eq!(resolve_profile("  ").expect("profile"), "default");
    }

    #[test]
    fn rejects_path_like_profiles() {
        assert!(resolve_profile("../other").is_err());
        assert!(resolve_profile("a/b").is_err());
        assert_eq!(resolve_profile("office-2").expect("profile"), "office-2");
    }
}
