use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use std::fs;

use crate::{get_logs_dir, safe_truncate};

fn describe_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed_url) => {
            let port = parsed_url.port().map(|p| p.to_string()).unwrap_or_else(|| {
                if parsed_url.scheme() == "https" {
                    "443 (default)".to_string()
                } else {
                    "80 (default)".to_string()
                }
            });
            format!(
                "URL: {}\nHost: {}\nPort: {}\nScheme: {}\n",
                url,
                parsed_url.host_str().unwrap_or("unknown"),
                port,
                parsed_url.scheme()
            )
        }
        Err(_) => format!("URL: {}\n", url),
    }
}

fn mask_key(api_key: &str) -> String {
    format!("{}***", api_key.chars().take(6).collect::<String>())
}

/// Print HTTP request details to the console (verbose mode only)
pub fn log_request(url: &str, request: &serde_json::Value, api_key: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());
    print!("{}", describe_url(url));
    println!("\n{}", "Headers:".bright_yellow());
    println!("  Content-Type: application/json");
    if !api_key.is_empty() {
        println!("  Authorization: Bearer {}", mask_key(api_key));
    }

    println!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(request) {
        Ok(json) => {
            if json.chars().count() > 5000 {
                println!("{}", safe_truncate(&json, 5000));
                println!("{}", format!("... (truncated, total {} bytes)", json.len()).bright_black());
            } else {
                println!("{}", json);
            }
        }
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }
    println!("{}", "═".repeat(80).bright_cyan());
}

/// Dump an HTTP request to `<logs dir>/req-<timestamp>-<model>-agent-<agent>.txt`
pub fn log_request_to_file(
    url: &str,
    request: &serde_json::Value,
    model: &str,
    agent_name: &str,
    api_key: &str,
) -> Result<()> {
    let logs_dir = get_logs_dir()?;
    let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f").to_string();
    let filename = format!(
        "req-{}-{}-agent-{}.txt",
        timestamp,
        model.replace('/', "-"),
        agent_name
    );
    let file_path = logs_dir.join(filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP REQUEST LOG\n");
    log_content.push_str("================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", timestamp));
    log_content.push_str(&format!("Model: {}\n", model));
    log_content.push_str(&format!("Agent: {}\n\n", agent_name));
    log_content.push_str(&describe_url(url));
    log_content.push('\n');
    log_content.push_str("Headers:\n");
    log_content.push_str("  Content-Type: application/json\n");
    if !api_key.is_empty() {
        log_content.push_str(&format!("  Authorization: Bearer {}\n", mask_key(api_key)));
    }
    log_content.push_str("\nRequest Body:\n");
    match serde_json::to_string_pretty(request) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => log_content.push_str(&format!("Error serializing request: {}\n", e)),
    }

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    Ok(())
}
