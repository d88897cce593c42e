use std::time::Duration;

const USER_AGENT: &str = concat!("owl/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client settings for toolkit requests
pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Render HTML as plain text
pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 120)
}

/// Cut `text` to at most `max_chars` characters, noting how much was dropped
pub(crate) fn limit_chars(text: String, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}\n\n[... truncated {} of {} characters]", truncated, total - max_chars, total)
}
