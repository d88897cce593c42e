// Logging module - diagnostic logger setup, conversation and request logging
pub mod conversation_logger;
pub mod request_logger;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub use conversation_logger::ConversationLogger;
pub use request_logger::{log_request, log_request_to_file};

/// Initialise the `log` facade.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug, else info.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (tests, embedded use) is not an error for us
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Get or create the base owl directory (`$OWL_HOME` or `~/.owl`)
pub fn get_owl_dir() -> Result<PathBuf> {
    let owl_dir = match std::env::var("OWL_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home_dir = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .context("Failed to get home directory")?;
            PathBuf::from(home_dir).join(".owl")
        }
    };

    if !owl_dir.exists() {
        std::fs::create_dir_all(&owl_dir).context("Failed to create owl directory")?;
    }

    Ok(owl_dir)
}

/// Get or create the request logs directory (`<owl dir>/logs`)
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = get_owl_dir()?.join("logs");

    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir).context("Failed to create logs directory")?;
    }

    Ok(logs_dir)
}
