//! Authorization code extraction.
//!
//! Users paste whatever their browser ended up on after consent: the full
//! redirect URL, a fragment of it, or only the code. Strategies run in order
//! and the first one that yields a code wins.

use url::Url;
use url::form_urlencoded;

const MAX_BARE_CODE_LEN: usize = 100;

type Strategy = fn(&str) -> Option<String>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("redirect_url", from_redirect_url),
    ("code_parameter", from_code_parameter),
    ("bare_code", from_bare_code),
];

pub fn extract_authorization_code(authorization_response: &str) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let code = strategy(authorization_response)?;
        tracing::debug!(strategy = name, "extracted authorization code");
        Some(code)
    })
}

fn from_redirect_url(input: &str) -> Option<String> {
    let input = input.trim();
    if !input.starts_with("http") {
        return None;
    }

    let url = Url::parse(input).ok()?;
    url.query_pairs()
        .find(|(key, value)| key == "code" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn from_code_parameter(input: &str) -> Option<String> {
    input.trim().split(['?', '#']).find_map(|segment| {
        form_urlencoded::parse(segment.as_bytes())
            .find(|(key, value)| key == "code" && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

fn from_bare_code(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.len() >= MAX_BARE_CODE_LEN || trimmed.contains('=') {
        return None;
    }

    Some(trimmed.to_string())
}
